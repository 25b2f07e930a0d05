//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, letterbox and mosaic.
//!
//! The production implementation is
//! [`CanvasBackend`](super::canvas_backend::CanvasBackend) — pure Rust on top
//! of the `image` crate. Tests use the recording [`tests::MockBackend`].

use super::geometry::InvalidDimensions;
use super::params::{LetterboxParams, MosaicParams};
use crate::types::{EncodedBuffer, SourceImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{name}: {source}")]
    InvalidDimensions {
        name: String,
        source: InvalidDimensions,
    },
    #[error("{name}: failed to decode image: {reason}")]
    Decode { name: String, reason: String },
    #[error("{name}: failed to encode output: {reason}")]
    Encode { name: String, reason: String },
    #[error("{name}: failed to encode tile {}: {reason}", .index + 1)]
    TileEncode {
        name: String,
        /// 0-based row-major tile index.
        index: usize,
        reason: String,
    },
    #[error("{name}: expected {expected} tiles, got {actual}")]
    TileCount {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Geometry is resolved before the backend is called; a backend only
/// decodes, draws, slices and encodes.
pub trait ImageBackend: Sync {
    /// Read pixel dimensions without a full decode.
    fn identify(&self, source: &SourceImage) -> Result<Dimensions, BackendError>;

    /// Draw the source onto a filled canvas and encode it.
    fn letterbox(
        &self,
        source: &SourceImage,
        params: &LetterboxParams,
    ) -> Result<EncodedBuffer, BackendError>;

    /// Render the composite once and encode every tile, row-major.
    fn mosaic(
        &self,
        source: &SourceImage,
        params: &MosaicParams,
    ) -> Result<Vec<EncodedBuffer>, BackendError>;
}
