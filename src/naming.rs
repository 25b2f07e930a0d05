//! Download filename conventions and media type ↔ extension mapping.
//!
//! Every output offered for download is named from the original file's
//! stem:
//!
//! - single mode: `dawn.jpg` → `dawn_resized.jpg`
//! - mosaic tiles: `dawn_parte_1.jpg` … `dawn_parte_9.jpg` (1-based, row-major)
//! - mosaic archive: `dawn_mosaico.zip`
//!
//! Extensions derived from a media type use its subtype, with the usual
//! short forms (`jpeg` → `jpg`) and `jpg` as the fallback.

/// Split a filename into stem and extension at the last dot.
///
/// - `"dawn.jpg"` → `("dawn", Some("jpg"))`
/// - `"my.trip.png"` → `("my.trip", Some("png"))`
/// - `"README"` → `("README", None)`
/// - `".hidden"` → `(".hidden", None)`
/// - `"trailing."` → `("trailing", None)`
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(pos) => {
            let ext = &name[pos + 1..];
            (&name[..pos], (!ext.is_empty()).then_some(ext))
        }
    }
}

/// Stem used as the base of every derived filename.
pub fn base_name(name: &str) -> &str {
    split_extension(name).0
}

/// File extension for a media type, e.g. `image/jpeg` → `jpg`.
pub fn extension_for_media_type(media_type: &str) -> String {
    let subtype = media_type
        .split(';')
        .next()
        .and_then(|essence| essence.split_once('/'))
        .map(|(_, sub)| sub.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match subtype.as_str() {
        "" | "jpeg" | "pjpeg" | "jpg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        "x-ms-bmp" => "bmp".to_string(),
        other => other.to_string(),
    }
}

/// Media type for a file extension, for inputs that arrive without one.
///
/// Returns `None` for extensions the decoders cannot read.
pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        "bmp" => Some("image/bmp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Download name for a single-mode output: `{stem}_resized.{ext}`.
///
/// Keeps the original extension; names without one take it from the
/// output's media type.
pub fn resized_filename(original_name: &str, output_media_type: &str) -> String {
    let (stem, ext) = split_extension(original_name);
    match ext {
        Some(ext) => format!("{stem}_resized.{ext}"),
        None => format!(
            "{stem}_resized.{}",
            extension_for_media_type(output_media_type)
        ),
    }
}

/// Archive entry name for a mosaic tile. `index` is 0-based.
pub fn tile_filename(base: &str, index: usize, media_type: &str) -> String {
    format!(
        "{base}_parte_{}.{}",
        index + 1,
        extension_for_media_type(media_type)
    )
}

/// Archive name for a mosaic: `{base}_mosaico.zip`.
pub fn mosaic_archive_name(base: &str) -> String {
    format!("{base}_mosaico.zip")
}
