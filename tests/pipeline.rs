//! End-to-end runs through the public API with real decoders and encoders.
//!
//! Targets are kept tiny so every test renders in milliseconds. The
//! nearest-neighbour filter keeps solid and gradient colours exact, which
//! lets the assertions compare pixels rather than tolerances.

use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};
use mosaic_print::batch::{Batch, ItemStatus, Mode};
use mosaic_print::imaging::{
    CanvasBackend, FitMode, MosaicParams, OutputFormat, Quality, TargetSpec, TileGrid, resolve_fit,
};
use mosaic_print::types::SourceImage;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn small_spec() -> TargetSpec {
    TargetSpec {
        horizontal_width: 40,
        vertical_height: 60,
        ..TargetSpec::default()
    }
}

fn piece_spec() -> TargetSpec {
    TargetSpec {
        horizontal_width: 10,
        vertical_height: 15,
        ..TargetSpec::default()
    }
}

fn backend() -> CanvasBackend {
    CanvasBackend::with_filter(FilterType::Nearest)
}

fn png(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn solid_png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    png(&RgbaImage::from_pixel(width, height, color))
}

/// Every pixel distinct, blue fixed at 128 so none is ever white.
fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    png(&RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 8) as u8, (y * 12) as u8, 128, 255])
    }))
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 90, 160]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn unzip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            (entry.name().to_string(), content)
        })
        .collect()
}

// =========================================================================
// Single mode
// =========================================================================

#[test]
fn landscape_png_fills_its_derived_canvas() {
    let batch = Batch::new(backend(), small_spec(), TileGrid::default());
    let ids = batch.enqueue(vec![
        SourceImage::new("red.png", "image/png", solid_png(80, 60, RED)).unwrap(),
    ]);
    assert_eq!(batch.status(ids[0]), Some(ItemStatus::Completed));

    let artifact = batch.export(ids[0]).unwrap();
    assert_eq!(artifact.filename, "red_resized.png");
    assert_eq!(artifact.buffer.media_type, "image/png");

    // Canvas 40 x round(60 * 60 / 80) = 40x45, image drawn over all of it
    let out = image::load_from_memory(&artifact.buffer.bytes)
        .unwrap()
        .to_rgba8();
    assert_eq!(out.dimensions(), (40, 45));
    assert_eq!(*out.get_pixel(20, 0), RED);
    assert_eq!(*out.get_pixel(20, 44), RED);
    assert!(out.pixels().all(|p| *p == RED));
}

#[test]
fn print_box_landscape_is_full_bleed() {
    // 400x300 into a 205x299 box: canvas 205 x round(299 * 300 / 400) = 205x224
    let spec = TargetSpec {
        horizontal_width: 205,
        vertical_height: 299,
        ..TargetSpec::default()
    };
    let batch = Batch::new(backend(), spec, TileGrid::default());
    let ids = batch.enqueue(vec![
        SourceImage::new("red.png", "image/png", solid_png(400, 300, RED)).unwrap(),
    ]);

    let out = image::load_from_memory(&batch.export(ids[0]).unwrap().buffer.bytes)
        .unwrap()
        .to_rgba8();
    assert_eq!(out.dimensions(), (205, 224));
    assert_eq!(*out.get_pixel(100, 0), RED);
    assert!(!out.pixels().any(|p| *p == WHITE));
}

#[test]
fn portrait_jpeg_keeps_vertical_height() {
    let batch = Batch::new(backend(), small_spec(), TileGrid::default());
    let ids = batch.enqueue(vec![
        SourceImage::new("tall.jpg", "image/jpeg", jpeg(60, 80)).unwrap(),
    ]);

    let artifact = batch.export(ids[0]).unwrap();
    assert_eq!(artifact.filename, "tall_resized.jpg");
    assert_eq!(artifact.buffer.media_type, "image/jpeg");

    let out = image::load_from_memory(&artifact.buffer.bytes).unwrap();
    assert_eq!(
        image::guess_format(&artifact.buffer.bytes).unwrap(),
        ImageFormat::Jpeg
    );
    assert_eq!(out.dimensions(), (30, 60));
}

#[test]
fn undecodable_item_fails_alone() {
    let batch = Batch::new(backend(), small_spec(), TileGrid::default());
    batch.enqueue(vec![
        SourceImage::new("ok1.png", "image/png", solid_png(8, 6, RED)).unwrap(),
        SourceImage::new("broken.png", "image/png", b"not an image".to_vec()).unwrap(),
        SourceImage::new("ok2.png", "image/png", solid_png(6, 8, RED)).unwrap(),
    ]);

    let items = batch.items();
    let statuses: Vec<ItemStatus> = items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![ItemStatus::Completed, ItemStatus::Error, ItemStatus::Completed]
    );
    assert!(items[1].error.as_deref().unwrap().contains("broken.png"));

    let names: Vec<String> = batch
        .export_all()
        .into_iter()
        .map(|(_, artifact)| artifact.unwrap().filename)
        .collect();
    assert_eq!(names, vec!["ok1_resized.png", "ok2_resized.png"]);
}

#[test]
fn non_image_input_is_rejected_at_intake() {
    let err = SourceImage::new("notes.txt", "text/plain", b"hello".to_vec()).unwrap_err();
    assert!(err.to_string().contains("notes.txt"));
}

// =========================================================================
// Mosaic mode
// =========================================================================

#[test]
fn mosaic_zip_reassembles_into_the_composite() {
    let bytes = gradient_png(30, 20);
    let source = SourceImage::new("grad.png", "image/png", bytes).unwrap();

    let batch = Batch::new(backend(), piece_spec(), TileGrid::default());
    batch.set_mode(Mode::Mosaic).unwrap();
    let ids = batch.enqueue(vec![source.clone()]);

    let artifact = batch.export(ids[0]).unwrap();
    assert_eq!(artifact.filename, "grad_mosaico.zip");
    assert_eq!(artifact.buffer.media_type, "application/zip");

    let entries = unzip(&artifact.buffer.bytes);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    let expected: Vec<String> = (1..=9).map(|n| format!("grad_parte_{n}.png")).collect();
    assert_eq!(names, expected);

    // Stitch the tiles back together, row-major
    let mut stitched = RgbaImage::new(30, 45);
    for (index, (_, content)) in entries.iter().enumerate() {
        let tile = image::load_from_memory(content).unwrap().to_rgba8();
        assert_eq!(tile.dimensions(), (10, 15));
        let (row, col) = (index as u32 / 3, index as u32 % 3);
        image::imageops::replace(&mut stitched, &tile, (col * 10) as i64, (row * 15) as i64);
    }

    let grid = TileGrid::default();
    let fit = resolve_fit((30, 20), grid.composite_size((10, 15)).unwrap(), FitMode::Cover).unwrap();
    let params = MosaicParams {
        fit,
        grid,
        piece_width: 10,
        piece_height: 15,
        background: WHITE,
        format: OutputFormat::Png,
        quality: Quality::default(),
    };
    let composite = backend().render_composite(&source, &params).unwrap();
    assert_eq!(stitched, composite);

    // Cover fit leaves no background showing
    assert!(stitched.pixels().all(|p| p[2] == 128 && p[3] == 255));
}

#[test]
fn mosaic_with_custom_grid() {
    let batch = Batch::new(backend(), piece_spec(), TileGrid::new(2, 2));
    batch.set_mode(Mode::Mosaic).unwrap();
    let ids = batch.enqueue(vec![
        SourceImage::new("sq.png", "image/png", solid_png(12, 12, RED)).unwrap(),
    ]);

    let entries = unzip(&batch.export(ids[0]).unwrap().buffer.bytes);
    assert_eq!(entries.len(), 4);
    for (_, content) in &entries {
        let tile = image::load_from_memory(content).unwrap().to_rgba8();
        assert_eq!(tile.dimensions(), (10, 15));
        assert!(tile.pixels().all(|p| *p == RED));
    }
}

#[test]
fn mode_is_locked_once_items_exist() {
    let batch = Batch::new(backend(), small_spec(), TileGrid::default());
    batch.enqueue(vec![
        SourceImage::new("a.png", "image/png", solid_png(4, 4, RED)).unwrap(),
    ]);
    assert!(batch.set_mode(Mode::Mosaic).is_err());
    assert_eq!(batch.mode(), Mode::Single);

    batch.reset();
    batch.set_mode(Mode::Mosaic).unwrap();
    assert_eq!(batch.mode(), Mode::Mosaic);
}
