//! Pure Rust canvas backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, BMP, GIF) | `image` crate (pure Rust decoders) |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Draw / clip | `image::imageops::overlay` onto a filled `RgbaImage` |
//! | Tile slicing | `image::imageops::crop_imm` + `replace` |
//! | Tile encode fan-out | `rayon` parallel iterator, ordered collect |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → other | `DynamicImage::write_to` (lossless encoders) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::geometry::{Fit, InvalidDimensions};
use super::params::{LetterboxParams, MosaicParams, OutputFormat, Quality};
use crate::types::{EncodedBuffer, SourceImage};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;

/// Pure Rust backend drawing onto in-memory RGBA canvases.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct CanvasBackend {
    filter: FilterType,
}

impl CanvasBackend {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    /// Use a different resampling filter for the scaling step.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Decode the source and draw it onto the full mosaic composite.
    ///
    /// This is the only place the source is scaled for a mosaic; every tile
    /// is cut from the returned canvas.
    pub fn render_composite(
        &self,
        source: &SourceImage,
        params: &MosaicParams,
    ) -> Result<RgbaImage, BackendError> {
        let img = decode(source)?;
        Ok(render_canvas(&img, &params.fit, params.background, self.filter))
    }
}

impl Default for CanvasBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &SourceImage) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source.bytes()))
        .with_guessed_format()
        .map_err(|e| decode_error(source, e))
}

fn decode_error(source: &SourceImage, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        name: source.name().to_string(),
        reason: err.to_string(),
    }
}

/// Decode the full image. The decoded buffer lives only as long as the
/// returned value.
fn decode(source: &SourceImage) -> Result<DynamicImage, BackendError> {
    reader(source)?
        .decode()
        .map_err(|e| decode_error(source, e))
}

/// Fill a canvas with the background and draw the scaled image at the
/// fit's placement. Parts outside the canvas are clipped.
pub fn render_canvas(
    img: &DynamicImage,
    fit: &Fit,
    background: Rgba<u8>,
    filter: FilterType,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(fit.canvas_width, fit.canvas_height, background);

    let rgba = img.to_rgba8();
    let scaled = if rgba.dimensions() == (fit.scaled_width, fit.scaled_height) {
        rgba
    } else {
        imageops::resize(&rgba, fit.scaled_width, fit.scaled_height, filter)
    };

    let (x, y) = fit.placement();
    imageops::overlay(&mut canvas, &scaled, x, y);
    canvas
}

/// Cut one tile out of the composite, `None` when the tile origin does not
/// fit in `u32`.
///
/// The tile starts filled with the background, so a composite that came out
/// short of the grid leaves fill rather than garbage.
pub fn slice_tile(composite: &RgbaImage, params: &MosaicParams, index: usize) -> Option<RgbaImage> {
    let (x, y, w, h) = params.tile_rect(index)?;
    let mut tile = RgbaImage::from_pixel(w, h, params.background);
    let region = imageops::crop_imm(composite, x, y, w, h).to_image();
    imageops::replace(&mut tile, &region, 0, 0);
    Some(tile)
}

/// Encode a canvas. JPEG honours `quality`; the other encoders are lossless.
fn encode(
    canvas: RgbaImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<EncodedBuffer, String> {
    let mut buf = Cursor::new(Vec::new());
    let img = DynamicImage::ImageRgba8(canvas);

    let written = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.into_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
            rgb.write_with_encoder(encoder)
        }
        OutputFormat::Png => img.write_to(&mut buf, ImageFormat::Png),
        OutputFormat::WebP => img.write_to(&mut buf, ImageFormat::WebP),
        OutputFormat::Tiff => img.write_to(&mut buf, ImageFormat::Tiff),
        OutputFormat::Bmp => img.write_to(&mut buf, ImageFormat::Bmp),
        OutputFormat::Gif => img.write_to(&mut buf, ImageFormat::Gif),
    };
    written.map_err(|e| e.to_string())?;

    let bytes = buf.into_inner();
    if bytes.is_empty() {
        return Err("encoder produced no data".to_string());
    }
    Ok(EncodedBuffer::new(format.media_type(), bytes))
}

impl ImageBackend for CanvasBackend {
    fn identify(&self, source: &SourceImage) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(source)?
            .into_dimensions()
            .map_err(|e| decode_error(source, e))?;
        Ok(Dimensions { width, height })
    }

    fn letterbox(
        &self,
        source: &SourceImage,
        params: &LetterboxParams,
    ) -> Result<EncodedBuffer, BackendError> {
        let img = decode(source)?;
        let canvas = render_canvas(&img, &params.fit, params.background, self.filter);
        drop(img);

        encode(canvas, params.format, params.quality).map_err(|reason| BackendError::Encode {
            name: source.name().to_string(),
            reason,
        })
    }

    fn mosaic(
        &self,
        source: &SourceImage,
        params: &MosaicParams,
    ) -> Result<Vec<EncodedBuffer>, BackendError> {
        let composite = self.render_composite(source, params)?;

        (0..params.grid.len())
            .into_par_iter()
            .map(|index| {
                let tile = slice_tile(&composite, params, index).ok_or_else(|| {
                    BackendError::InvalidDimensions {
                        name: source.name().to_string(),
                        source: InvalidDimensions {
                            source_width: params.fit.scaled_width,
                            source_height: params.fit.scaled_height,
                            target_width: params.piece_width,
                            target_height: params.piece_height,
                        },
                    }
                })?;
                encode(tile, params.format, params.quality).map_err(|reason| {
                    BackendError::TileEncode {
                        name: source.name().to_string(),
                        index,
                        reason,
                    }
                })
            })
            .collect()
    }
}
