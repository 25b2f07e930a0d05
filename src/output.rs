//! CLI output formatting for batch runs.
//!
//! Output is item-centric: every line leads with the item's positional
//! index and display name, so progress reads as an inventory of the batch.
//!
//! # Output Format
//!
//! ```text
//! Mosaic 3x3, 2050x2994 per piece
//! 001 dawn.jpg: queued
//! 002 broken.jpg: queued
//! 001 dawn.jpg: processing
//! 001 dawn.jpg: completed, 9 tiles
//! 002 broken.jpg: processing
//! 002 broken.jpg: error
//!     broken.jpg: decode failed: ...
//!
//! Exports
//! 001 dawn.jpg → out/dawn_mosaico.zip (3.4 MB)
//!
//! Completed 1 of 2 images, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, ItemId, ItemSnapshot, ItemStatus, Mode};
use crate::imaging::{TargetSpec, TileGrid};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: u64) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn item_label(id: ItemId, name: &str) -> String {
    format!("{} {}", format_index(id.get()), name)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Human-readable byte size: `512 B`, `12.3 KB`, `3.4 MB`.
fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

// ============================================================================
// Run header
// ============================================================================

/// One-line description of what the run produces.
pub fn format_run_header(mode: Mode, spec: &TargetSpec, grid: TileGrid) -> Vec<String> {
    let line = match mode {
        Mode::Single => format!(
            "Resize to {} wide (landscape) / {} tall (portrait), quality {}",
            spec.horizontal_width,
            spec.vertical_height,
            spec.quality.value()
        ),
        Mode::Mosaic => format!(
            "Mosaic {}x{}, {}x{} per piece",
            grid.rows, grid.cols, spec.horizontal_width, spec.vertical_height
        ),
    };
    vec![line]
}

pub fn print_run_header(mode: Mode, spec: &TargetSpec, grid: TileGrid) {
    for line in format_run_header(mode, spec, grid) {
        println!("{}", line);
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Format one batch event as display lines.
///
/// Errors put the failure message on an indented context line.
pub fn format_batch_event(event: &BatchEvent, mode: Mode) -> Vec<String> {
    match event {
        BatchEvent::StatusChanged {
            id,
            name,
            status,
            outputs,
            error,
        } => {
            let label = item_label(*id, name);
            match status {
                ItemStatus::Idle => vec![format!("{label}: queued")],
                ItemStatus::Processing => vec![format!("{label}: processing")],
                ItemStatus::Completed => {
                    let detail = match mode {
                        Mode::Single => plural(*outputs, "image", "images"),
                        Mode::Mosaic => plural(*outputs, "tile", "tiles"),
                    };
                    vec![format!("{label}: completed, {detail}")]
                }
                ItemStatus::Error => {
                    let mut lines = vec![format!("{label}: error")];
                    if let Some(msg) = error {
                        lines.push(format!("{}{}", indent(1), msg));
                    }
                    lines
                }
            }
        }
        BatchEvent::Removed { id, name } => vec![format!("{}: removed", item_label(*id, name))],
        BatchEvent::Cleared { count } => {
            vec![format!("Cleared {}", plural(*count, "item", "items"))]
        }
    }
}

// ============================================================================
// Exports and summary
// ============================================================================

/// A written artifact.
pub fn format_export(id: ItemId, name: &str, path: &Path, bytes: usize) -> String {
    format!(
        "{} → {} ({})",
        item_label(id, name),
        path.display(),
        format_bytes(bytes)
    )
}

/// An export that could not be produced.
pub fn format_export_error(id: ItemId, err: &dyn std::error::Error) -> Vec<String> {
    vec![
        format!("{}: export failed", format_index(id.get())),
        format!("{}{}", indent(1), err),
    ]
}

/// Final tally over the batch.
pub fn format_summary(items: &[ItemSnapshot]) -> Vec<String> {
    let completed = items
        .iter()
        .filter(|i| i.status == ItemStatus::Completed)
        .count();
    let failed = items
        .iter()
        .filter(|i| i.status == ItemStatus::Error)
        .count();

    let mut line = format!(
        "Completed {} of {}",
        completed,
        plural(items.len(), "image", "images")
    );
    if failed > 0 {
        line.push_str(&format!(", {failed} failed"));
    }
    vec![line]
}

pub fn print_summary(items: &[ItemSnapshot]) {
    for line in format_summary(items) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: ItemStatus) -> ItemSnapshot {
        ItemSnapshot {
            id: serde_json::from_str("1").unwrap(),
            name: "a.jpg".into(),
            media_type: "image/jpeg".into(),
            status,
            outputs: 0,
            output_bytes: 0,
            error: None,
        }
    }

    fn id(n: u64) -> ItemId {
        serde_json::from_str(&n.to_string()).unwrap()
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 + 400 * 1024), "3.4 MB");
    }

    // =========================================================================
    // Event lines
    // =========================================================================

    #[test]
    fn completed_single_item() {
        let event = BatchEvent::StatusChanged {
            id: id(1),
            name: "dawn.jpg".into(),
            status: ItemStatus::Completed,
            outputs: 1,
            error: None,
        };
        assert_eq!(
            format_batch_event(&event, Mode::Single),
            vec!["001 dawn.jpg: completed, 1 image"]
        );
    }

    #[test]
    fn completed_mosaic_item_counts_tiles() {
        let event = BatchEvent::StatusChanged {
            id: id(12),
            name: "dawn.jpg".into(),
            status: ItemStatus::Completed,
            outputs: 9,
            error: None,
        };
        assert_eq!(
            format_batch_event(&event, Mode::Mosaic),
            vec!["012 dawn.jpg: completed, 9 tiles"]
        );
    }

    #[test]
    fn error_message_is_indented() {
        let event = BatchEvent::StatusChanged {
            id: id(2),
            name: "bad.jpg".into(),
            status: ItemStatus::Error,
            outputs: 0,
            error: Some("bad.jpg: decode failed: eof".into()),
        };
        assert_eq!(
            format_batch_event(&event, Mode::Single),
            vec!["002 bad.jpg: error", "    bad.jpg: decode failed: eof"]
        );
    }

    #[test]
    fn queued_and_removed_lines() {
        let queued = BatchEvent::StatusChanged {
            id: id(3),
            name: "c.png".into(),
            status: ItemStatus::Idle,
            outputs: 0,
            error: None,
        };
        assert_eq!(format_batch_event(&queued, Mode::Single), vec!["003 c.png: queued"]);

        let removed = BatchEvent::Removed {
            id: id(3),
            name: "c.png".into(),
        };
        assert_eq!(format_batch_event(&removed, Mode::Single), vec!["003 c.png: removed"]);
    }

    #[test]
    fn cleared_line() {
        let event = BatchEvent::Cleared { count: 1 };
        assert_eq!(format_batch_event(&event, Mode::Single), vec!["Cleared 1 item"]);
    }

    // =========================================================================
    // Header, exports, summary
    // =========================================================================

    #[test]
    fn run_header_for_mosaic() {
        let lines = format_run_header(Mode::Mosaic, &TargetSpec::default(), TileGrid::default());
        assert_eq!(lines, vec!["Mosaic 3x3, 2050x2994 per piece"]);
    }

    #[test]
    fn run_header_for_single() {
        let lines = format_run_header(Mode::Single, &TargetSpec::default(), TileGrid::default());
        assert!(lines[0].contains("2050 wide"));
        assert!(lines[0].contains("quality 95"));
    }

    #[test]
    fn export_line() {
        let line = format_export(id(1), "dawn.jpg", Path::new("out/dawn_resized.jpg"), 100);
        assert_eq!(line, "001 dawn.jpg → out/dawn_resized.jpg (100 B)");
    }

    #[test]
    fn summary_counts_completed_and_failed() {
        let items = vec![
            snapshot(ItemStatus::Completed),
            snapshot(ItemStatus::Error),
            snapshot(ItemStatus::Completed),
        ];
        assert_eq!(format_summary(&items), vec!["Completed 2 of 3 images, 1 failed"]);
    }

    #[test]
    fn summary_without_failures() {
        let items = vec![snapshot(ItemStatus::Completed)];
        assert_eq!(format_summary(&items), vec!["Completed 1 of 1 image"]);
    }
}
