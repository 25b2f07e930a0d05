//! Image geometry and rendering in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Letterbox resize** | Lanczos3 onto a filled canvas, encoded in the source format |
//! | **Mosaic** | cover-fit composite rendered once, sliced into a [`TileGrid`] |
//!
//! The module is split into:
//! - **Geometry**: Pure functions for fit math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`CanvasBackend`]
//! - **Operations**: High-level functions combining geometry + backend

pub mod backend;
pub mod canvas_backend;
mod geometry;
pub mod operations;
mod params;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use canvas_backend::CanvasBackend;
pub use geometry::{Fit, FitMode, InvalidDimensions, letterbox_canvas, resolve_fit};
pub use operations::{get_dimensions, resize_image, tile_image};
pub use params::{
    LetterboxParams, MosaicParams, OutputFormat, Quality, TargetSpec, TileGrid,
};
