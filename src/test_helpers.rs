//! Shared test utilities: synthetic images and ready-made sources.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = jpeg_source("photo.jpg", 200, 150);
//! let red = png_source("red.png", solid_png(40, 30, Rgba([255, 0, 0, 255])));
//! ```

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

use crate::types::SourceImage;

// =========================================================================
// Encoded images
// =========================================================================

/// PNG of a single color.
pub fn solid_png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, color);
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Opaque PNG where every pixel is distinct: red follows x, green follows y.
///
/// Useful when a test needs to tell which source pixel ended up where.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Small JPEG with a smooth color ramp.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

// =========================================================================
// Sources
// =========================================================================

pub fn jpeg_source(name: &str, width: u32, height: u32) -> SourceImage {
    SourceImage::new(name, "image/jpeg", jpeg_bytes(width, height)).unwrap()
}

pub fn png_source(name: &str, bytes: Vec<u8>) -> SourceImage {
    SourceImage::new(name, "image/png", bytes).unwrap()
}
