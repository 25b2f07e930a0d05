//! Pure geometry for placing a source image on an output canvas.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Two fit modes are supported:
//!
//! - [`FitMode::Letterbox`]: the whole source is visible. The canvas pins one
//!   axis to the configured constant (width for landscape sources, height for
//!   portrait ones) and derives the other from the source aspect ratio, then
//!   the image is drawn at the canvas size. Offsets are still computed from
//!   the two sizes and come out zero.
//! - [`FitMode::Cover`]: the canvas is exactly the target box and the source
//!   is scaled until the box is fully covered. Overflow on the non-limiting
//!   axis falls outside the canvas and is clipped.
//!
//! Scaled dimensions are rounded to whole pixels. Offsets stay fractional
//! here; the renderer snaps them with [`Fit::placement`] for its single draw.

use thiserror::Error;

/// Zero-sized geometry cannot be resolved.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error(
    "invalid dimensions: source {source_width}x{source_height}, target {target_width}x{target_height}"
)]
pub struct InvalidDimensions {
    pub source_width: u32,
    pub source_height: u32,
    pub target_width: u32,
    pub target_height: u32,
}

/// How the source is mapped onto the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Derive the canvas from the source orientation and fill it.
    Letterbox,
    /// Scale until the box is covered, crop the overflow.
    Cover,
}

/// Resolved placement of a scaled source on its canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale: f64,
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Horizontal position of the scaled image's left edge. Negative in
    /// cover mode when the image overflows the canvas.
    pub offset_x: f64,
    pub offset_y: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Fit {
    /// Offsets snapped to the pixel grid.
    pub fn placement(&self) -> (i64, i64) {
        (self.offset_x.round() as i64, self.offset_y.round() as i64)
    }
}

/// Resolve scale, scaled size, canvas size and centering offsets.
///
/// # Arguments
/// * `source` - Source image dimensions (width, height)
/// * `target` - Configured box (width, height). In letterbox mode only one
///   axis is used as-is, see [`letterbox_canvas`].
/// * `mode` - Letterbox or cover fit
///
/// # Examples
/// ```
/// # use mosaic_print::imaging::{FitMode, resolve_fit};
/// // 4:3 landscape on the print box: drawn full-bleed on 2050x2246
/// let fit = resolve_fit((4000, 3000), (2050, 2994), FitMode::Letterbox).unwrap();
/// assert_eq!((fit.canvas_width, fit.canvas_height), (2050, 2246));
/// assert_eq!((fit.scaled_width, fit.scaled_height), (2050, 2246));
/// assert_eq!(fit.placement(), (0, 0));
///
/// let fit = resolve_fit((1000, 1000), (6150, 8982), FitMode::Cover).unwrap();
/// assert_eq!((fit.scaled_width, fit.scaled_height), (8982, 8982));
/// assert_eq!(fit.placement(), (-1416, 0));
/// ```
pub fn resolve_fit(
    source: (u32, u32),
    target: (u32, u32),
    mode: FitMode,
) -> Result<Fit, InvalidDimensions> {
    let (src_w, src_h) = source;
    let (box_w, box_h) = target;

    if src_w == 0 || src_h == 0 || box_w == 0 || box_h == 0 {
        return Err(InvalidDimensions {
            source_width: src_w,
            source_height: src_h,
            target_width: box_w,
            target_height: box_h,
        });
    }

    let (canvas_w, canvas_h, scale, scaled_w, scaled_h) = match mode {
        FitMode::Letterbox => {
            let (canvas_w, canvas_h) = letterbox_canvas(source, target);
            // Scale along the pinned axis
            let scale = if src_w > src_h {
                canvas_w as f64 / src_w as f64
            } else {
                canvas_h as f64 / src_h as f64
            };
            (canvas_w, canvas_h, scale, canvas_w, canvas_h)
        }
        FitMode::Cover => {
            // Compare box_w / src_w against box_h / src_h without division so
            // the limiting axis maps onto the canvas exactly.
            let x_is_tighter = box_w as u64 * src_h as u64 <= box_h as u64 * src_w as u64;
            let (num, den) = if x_is_tighter {
                (box_h, src_h)
            } else {
                (box_w, src_w)
            };
            let scaled_w = scale_length(src_w, num, den);
            let scaled_h = scale_length(src_h, num, den);
            (box_w, box_h, num as f64 / den as f64, scaled_w, scaled_h)
        }
    };

    Ok(Fit {
        scale,
        scaled_width: scaled_w,
        scaled_height: scaled_h,
        offset_x: (canvas_w as f64 - scaled_w as f64) / 2.0,
        offset_y: (canvas_h as f64 - scaled_h as f64) / 2.0,
        canvas_width: canvas_w,
        canvas_height: canvas_h,
    })
}

/// Canvas size for a letterboxed single-image output.
///
/// Landscape sources (`width > height`) pin the width to `target.0` and
/// derive the height as `round(target.1 * height / width)`. Everything else
/// pins the height to `target.1` and derives the width as
/// `round(target.0 * width / height)`. A square source lands on `target`
/// exactly through either branch.
///
/// # Examples
/// ```
/// # use mosaic_print::imaging::letterbox_canvas;
/// // 4:3 landscape against the 2050x2994 print box
/// assert_eq!(letterbox_canvas((4000, 3000), (2050, 2994)), (2050, 2246));
/// ```
pub fn letterbox_canvas(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (box_w, box_h) = target;

    if src_w > src_h {
        let h = (box_h as f64 * src_h as f64 / src_w as f64).round() as u32;
        (box_w, h.max(1))
    } else {
        let w = (box_w as f64 * src_w as f64 / src_h as f64).round() as u32;
        (w.max(1), box_h)
    }
}

/// Scale `len` by `num / den`, rounded to the nearest whole pixel, never below one.
fn scale_length(len: u32, num: u32, den: u32) -> u32 {
    ((len as f64 * num as f64 / den as f64).round() as u32).max(1)
}
