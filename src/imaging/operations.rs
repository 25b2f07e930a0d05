//! High-level image operations.
//!
//! These functions combine geometry with backend execution. They read the
//! source dimensions, resolve the fit, build the parameters and call the
//! backend.

use super::backend::{BackendError, ImageBackend};
use super::geometry::{FitMode, InvalidDimensions, resolve_fit};
use super::params::{LetterboxParams, MosaicParams, OutputFormat, TargetSpec, TileGrid};
use crate::types::{EncodedBuffer, SourceImage};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &SourceImage) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// Resize one image onto its letterboxed print canvas.
///
/// The canvas pins the configured width for landscape sources and the
/// configured height for portrait ones. Output is encoded in the source's
/// media type (JPEG when it is empty or unsupported).
pub fn resize_image(
    backend: &impl ImageBackend,
    source: &SourceImage,
    spec: &TargetSpec,
) -> Result<EncodedBuffer> {
    let dims = get_dimensions(backend, source)?;
    let fit = resolve_fit(dims, spec.target_box(), FitMode::Letterbox).map_err(|e| {
        BackendError::InvalidDimensions {
            name: source.name().to_string(),
            source: e,
        }
    })?;
    log::debug!(
        "{}: {}x{} -> canvas {}x{}, scaled {}x{}",
        source.name(),
        dims.0,
        dims.1,
        fit.canvas_width,
        fit.canvas_height,
        fit.scaled_width,
        fit.scaled_height
    );

    let params = LetterboxParams {
        fit,
        background: spec.background,
        format: OutputFormat::from_media_type(source.media_type()),
        quality: spec.quality,
    };
    backend.letterbox(source, &params)
}

/// Cut one image into a grid of print pieces.
///
/// Each piece is `spec.target_box()`; the source is cover-fitted onto the
/// composite of all pieces. A composite too large for `u32` is
/// [`BackendError::InvalidDimensions`]. Returns exactly `grid.len()` buffers in
/// row-major order or an error; partial results are never returned.
pub fn tile_image(
    backend: &impl ImageBackend,
    source: &SourceImage,
    spec: &TargetSpec,
    grid: TileGrid,
) -> Result<Vec<EncodedBuffer>> {
    let dims = get_dimensions(backend, source)?;
    let invalid = |e: InvalidDimensions| BackendError::InvalidDimensions {
        name: source.name().to_string(),
        source: e,
    };
    let composite = grid
        .composite_size(spec.target_box())
        .ok_or_else(|| {
            invalid(InvalidDimensions {
                source_width: dims.0,
                source_height: dims.1,
                target_width: spec.horizontal_width,
                target_height: spec.vertical_height,
            })
        })?;
    let fit = resolve_fit(dims, composite, FitMode::Cover).map_err(invalid)?;
    log::debug!(
        "{}: {}x{} -> composite {}x{}, scale {:.4}, offset ({}, {})",
        source.name(),
        dims.0,
        dims.1,
        composite.0,
        composite.1,
        fit.scale,
        fit.offset_x,
        fit.offset_y
    );

    let params = MosaicParams {
        fit,
        grid,
        piece_width: spec.horizontal_width,
        piece_height: spec.vertical_height,
        background: spec.background,
        format: OutputFormat::from_media_type(source.media_type()),
        quality: spec.quality,
    };
    let tiles = backend.mosaic(source, &params)?;
    if tiles.len() != grid.len() {
        return Err(BackendError::TileCount {
            name: source.name().to_string(),
            expected: grid.len(),
            actual: tiles.len(),
        });
    }
    Ok(tiles)
}
