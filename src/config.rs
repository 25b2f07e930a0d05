//! Print configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are the base layer; a user file only lists the values it overrides.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [target]
//! horizontal_width = 2050   # Canvas width for landscape sources, px
//! vertical_height = 2994    # Canvas height for portrait sources, px
//! background = "#ffffff"    # Fill behind transparent pixels and uncovered tile area
//! quality = 0.95            # Lossy encoder quality, fraction in (0, 1]
//!
//! [mosaic]
//! rows = 3
//! cols = 3
//!
//! [intake]
//! max_batch = 100           # Max images accepted per run
//!
//! [processing]
//! max_processes = 4         # Max parallel tile encoders (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only switch to a black background
//! [target]
//! background = "#000"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, TargetSpec, TileGrid};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest accepted canvas edge, px.
pub const MAX_EDGE: u32 = 20_000;
/// Largest accepted number of grid rows or columns.
pub const MAX_GRID_SIDE: u32 = 8;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Print target: canvas sizes, fill, encoder quality.
    pub target: TargetConfig,
    /// Mosaic grid.
    pub mosaic: MosaicConfig,
    /// Limits applied by the shell when accepting inputs.
    pub intake: IntakeConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.target;
        for (key, value) in [
            ("horizontal_width", t.horizontal_width),
            ("vertical_height", t.vertical_height),
        ] {
            if value == 0 || value > MAX_EDGE {
                return Err(ConfigError::Validation(format!(
                    "target.{key} must be 1-{MAX_EDGE}"
                )));
            }
        }
        if !(t.quality > 0.0 && t.quality <= 1.0) {
            return Err(ConfigError::Validation(
                "target.quality must be in (0, 1]".into(),
            ));
        }
        parse_hex_color(&t.background)?;

        for (key, value) in [("rows", self.mosaic.rows), ("cols", self.mosaic.cols)] {
            if value == 0 || value > MAX_GRID_SIDE {
                return Err(ConfigError::Validation(format!(
                    "mosaic.{key} must be 1-{MAX_GRID_SIDE}"
                )));
            }
        }
        if self.intake.max_batch == 0 {
            return Err(ConfigError::Validation(
                "intake.max_batch must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Render target built from the `[target]` table.
    pub fn target_spec(&self) -> Result<TargetSpec, ConfigError> {
        Ok(TargetSpec {
            horizontal_width: self.target.horizontal_width,
            vertical_height: self.target.vertical_height,
            background: parse_hex_color(&self.target.background)?,
            quality: Quality::from_fraction(self.target.quality),
        })
    }

    pub fn tile_grid(&self) -> TileGrid {
        TileGrid::new(self.mosaic.rows, self.mosaic.cols)
    }
}

/// Print target settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub horizontal_width: u32,
    pub vertical_height: u32,
    /// `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub background: String,
    pub quality: f32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            horizontal_width: 2050,
            vertical_height: 2994,
            background: "#ffffff".to_string(),
            quality: 0.95,
        }
    }
}

/// Mosaic settings. The mode itself comes from the CLI command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MosaicConfig {
    pub rows: u32,
    pub cols: u32,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntakeConfig {
    pub max_batch: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self { max_batch: 100 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel tile encoders.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into an RGBA color.
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>, ConfigError> {
    let invalid = || ConfigError::Validation(format!("invalid color '{value}'"));
    let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 | 8 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Ok(Rgba([r, g, b, a]))
        }
        _ => Err(invalid()),
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    // Plain structs of scalars and strings always serialize.
    toml::Value::try_from(AppConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` file.
///
/// A missing file is an error; callers without a file use
/// [`AppConfig::default`].
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(overlay))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mosaic-print configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Print target
# ---------------------------------------------------------------------------
[target]
# Canvas width for landscape sources (wider than tall), in pixels.
# Also the width of every mosaic piece.
horizontal_width = 2050

# Canvas height for portrait and square sources, in pixels.
# Also the height of every mosaic piece.
vertical_height = 2994

# Fill behind transparent pixels and any tile area the image does not cover.
# Accepts #rgb, #rrggbb or #rrggbbaa.
background = "#ffffff"

# Lossy encoder quality as a fraction in (0, 1]. Lossless formats ignore it.
quality = 0.95

# ---------------------------------------------------------------------------
# Mosaic
# ---------------------------------------------------------------------------
[mosaic]
# Grid size used by the `mosaic` command. Each source is cut into rows x cols pieces.
rows = 3
cols = 3

# ---------------------------------------------------------------------------
# Intake
# ---------------------------------------------------------------------------
[intake]
# Maximum number of images accepted in one run.
max_batch = 100

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel tile encoders.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
