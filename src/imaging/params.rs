//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which resolves geometry) and the [`backend`](super::backend) (which does
//! the actual pixel work). This separation allows swapping backends (e.g. for
//! testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100). Clamped on construction.
//! - [`OutputFormat`] — Encoder selected from a media type, JPEG fallback.
//! - [`TargetSpec`] — Print box, background fill and quality for a batch.
//! - [`TileGrid`] — Rows × columns of a mosaic, 3×3 by default.
//! - [`LetterboxParams`] — Everything a single-image render needs.
//! - [`MosaicParams`] — Everything a composite render and its slicing need.

use super::geometry::Fit;
use image::Rgba;
use serde::Serialize;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Build from a `0.0..=1.0` fraction, e.g. `0.95` → `95`.
    pub fn from_fraction(fraction: f32) -> Self {
        Self::new((fraction * 100.0).round() as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Encoders compiled into the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
    Bmp,
    Gif,
}

impl OutputFormat {
    /// Pick the encoder for a declared media type. Empty or unknown types
    /// fall back to JPEG.
    pub fn from_media_type(media_type: &str) -> Self {
        match media_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/webp" => Self::WebP,
            "image/tiff" => Self::Tiff,
            "image/bmp" | "image/x-ms-bmp" => Self::Bmp,
            "image/gif" => Self::Gif,
            _ => Self::Jpeg,
        }
    }

    /// Canonical media type written on encoded buffers.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
        }
    }
}

/// Target box, fill and quality shared by every item of a batch.
///
/// `horizontal_width` pins the canvas width of landscape sources;
/// `vertical_height` pins the canvas height of portrait ones. In mosaic mode
/// the pair is the size of a single piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSpec {
    pub horizontal_width: u32,
    pub vertical_height: u32,
    pub background: Rgba<u8>,
    pub quality: Quality,
}

impl TargetSpec {
    pub fn target_box(&self) -> (u32, u32) {
        (self.horizontal_width, self.vertical_height)
    }
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            horizontal_width: 2050,
            vertical_height: 2994,
            background: Rgba([255, 255, 255, 255]),
            quality: Quality::default(),
        }
    }
}

/// Logical arrangement of mosaic tiles.
///
/// Tiles are addressed by `(row, col)` and linearized row-major: the
/// 0-based index is `row * cols + col`, the display number adds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileGrid {
    pub rows: u32,
    pub cols: u32,
}

impl TileGrid {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(row, col)` of a 0-based linear index.
    pub fn position(&self, index: usize) -> (u32, u32) {
        let cols = self.cols as usize;
        ((index / cols) as u32, (index % cols) as u32)
    }

    /// Composite canvas size for pieces of the given size, `None` when it
    /// does not fit in `u32`.
    pub fn composite_size(&self, piece: (u32, u32)) -> Option<(u32, u32)> {
        Some((
            piece.0.checked_mul(self.cols)?,
            piece.1.checked_mul(self.rows)?,
        ))
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self { rows: 3, cols: 3 }
    }
}

/// Parameters for a letterboxed single-image render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxParams {
    pub fit: Fit,
    pub background: Rgba<u8>,
    pub format: OutputFormat,
    pub quality: Quality,
}

/// Parameters for a mosaic render: one composite, sliced into tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicParams {
    /// Cover fit against the composite canvas.
    pub fit: Fit,
    pub grid: TileGrid,
    pub piece_width: u32,
    pub piece_height: u32,
    pub background: Rgba<u8>,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl MosaicParams {
    /// Sub-rectangle `(x, y, width, height)` of the composite for a tile,
    /// `None` when its origin overflows `u32`.
    pub fn tile_rect(&self, index: usize) -> Option<(u32, u32, u32, u32)> {
        let (row, col) = self.grid.position(index);
        Some((
            col.checked_mul(self.piece_width)?,
            row.checked_mul(self.piece_height)?,
            self.piece_width,
            self.piece_height,
        ))
    }
}
