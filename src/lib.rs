//! # Mosaic Print
//!
//! Prepares batches of photos for fixed-size printing. Two modes:
//!
//! - **Single**: each image is drawn without cropping onto a print canvas.
//!   Landscape sources keep the configured width (2050 px by default),
//!   portrait and square sources keep the configured height (2994 px); the
//!   other edge is derived from the source aspect ratio and the image fills
//!   the whole canvas. The background colour shows only through transparency.
//! - **Mosaic**: each image is scaled to cover a grid of print pieces (3×3
//!   by default), centred and clipped, then cut into one file per piece.
//!   Reassembled edge to edge, the pieces reproduce the composite exactly.
//!
//! # Architecture
//!
//! ```text
//! SourceImage ─▶ Batch ─▶ geometry ─▶ ImageBackend ─▶ EncodedBuffer(s)
//!                  │                                         │
//!                  └──────────── export ◀── archive (zip) ◀──┘
//! ```
//!
//! Geometry is pure arithmetic and is tested without touching pixels. All
//! pixel work sits behind the [`imaging::ImageBackend`] trait, so the batch
//! orchestrator and the operations are unit-tested against a mock backend,
//! while [`imaging::CanvasBackend`] does the real decode/draw/encode with
//! the `image` crate.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Fit geometry, render parameters, backend trait and the `image`-crate backend |
//! | [`batch`] | Ordered queue, per-item lifecycle, status events, export |
//! | [`archive`] | Zip packaging of mosaic tiles |
//! | [`naming`] | Media type ↔ extension mapping and download filenames |
//! | [`types`] | `SourceImage` and `EncodedBuffer` |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Item at a Time
//!
//! Items render serially in arrival order. A print-sized mosaic composite
//! is tens of megapixels; rendering several at once multiplies peak memory
//! for no gain in a tool whose bottleneck is the user feeding it files.
//! Parallelism is used only inside one mosaic, to encode its tiles.
//!
//! ## Render Once, Slice Many
//!
//! A mosaic is drawn onto a single composite canvas and every tile is cut
//! from it. Tiles never resample the source independently, so no seam can
//! appear between neighbouring pieces.
//!
//! ## Integer Geometry
//!
//! Which axis limits a cover fit is decided by cross-multiplying integers
//! rather than comparing float ratios, so a mosaic composite is never left
//! one pixel short through rounding noise. Grid products use checked
//! multiplication.

pub mod archive;
pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
