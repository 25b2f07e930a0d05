use clap::{Parser, Subcommand};
use mosaic_print::batch::{Batch, ItemSnapshot, Mode};
use mosaic_print::config::{self, AppConfig};
use mosaic_print::imaging::CanvasBackend;
use mosaic_print::naming::{media_type_for_extension, split_extension};
use mosaic_print::output;
use mosaic_print::types::SourceImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser)]
#[command(name = "mosaic-print")]
#[command(about = "Batch-prepare photos for fixed-size prints and multi-panel mosaics")]
#[command(long_about = "\
Batch-prepare photos for fixed-size prints and multi-panel mosaics

resize: every image is drawn, without cropping, onto a print canvas. Landscape
sources keep the configured width, portrait and square sources keep the
configured height; the other edge is derived from the source aspect ratio.

mosaic: every image is scaled to cover a grid of print pieces (3x3 by default)
and cut into one file per piece, bundled as <name>_mosaico.zip.

Inputs may be files or directories; directories are searched recursively for
JPEG, PNG, WebP, TIFF, BMP and GIF files.

Run 'mosaic-print gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file [default: ./config.toml when present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Shared flags for commands that process images.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "out")]
    output: PathBuf,

    /// Write a JSON report of every item to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Letterbox each image onto its print canvas
    Resize(RunArgs),
    /// Cut each image into a grid of print pieces
    Mosaic {
        #[command(flatten)]
        run: RunArgs,
        /// Grid rows (overrides config)
        #[arg(long)]
        rows: Option<u32>,
        /// Grid columns (overrides config)
        #[arg(long)]
        cols: Option<u32>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Serialize)]
struct Report<'a> {
    mode: Mode,
    items: &'a [ItemSnapshot],
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut app_config = load_app_config(cli.config.as_deref())?;
    let (run, mode) = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Resize(run) => (run, Mode::Single),
        Command::Mosaic { run, rows, cols } => {
            if let Some(rows) = rows {
                app_config.mosaic.rows = rows;
            }
            if let Some(cols) = cols {
                app_config.mosaic.cols = cols;
            }
            app_config.validate()?;
            (run, Mode::Mosaic)
        }
    };

    let paths = collect_inputs(&run.inputs)?;
    if paths.is_empty() {
        return Err("no images found in the given inputs".into());
    }
    if paths.len() > app_config.intake.max_batch {
        return Err(format!(
            "{} images given, at most {} per run (intake.max_batch)",
            paths.len(),
            app_config.intake.max_batch
        )
        .into());
    }
    let sources = read_sources(&paths)?;

    init_thread_pool(&app_config.processing);
    let spec = app_config.target_spec()?;
    let grid = app_config.tile_grid();

    let (tx, rx) = std::sync::mpsc::channel();
    let batch = Batch::new(CanvasBackend::new(), spec, grid).with_events(tx);
    batch.set_mode(mode)?;
    output::print_run_header(mode, batch.spec(), grid);

    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_batch_event(&event, mode) {
                println!("{}", line);
            }
        }
    });

    batch.enqueue(sources);

    let items = batch.items();
    std::fs::create_dir_all(&run.output)?;
    let mut export_lines = Vec::new();
    for (id, artifact) in batch.export_all() {
        match artifact {
            Ok(artifact) => {
                let path = run.output.join(&artifact.filename);
                std::fs::write(&path, &artifact.buffer.bytes)?;
                let name = items
                    .iter()
                    .find(|item| item.id == id)
                    .map_or("", |item| item.name.as_str());
                export_lines.push(output::format_export(
                    id,
                    name,
                    &path,
                    artifact.buffer.len(),
                ));
            }
            Err(err) => export_lines.extend(output::format_export_error(id, &err)),
        }
    }

    // Dropping the batch closes the event channel and ends the printer.
    drop(batch);
    if printer.join().is_err() {
        log::error!("progress printer panicked");
    }

    if !export_lines.is_empty() {
        println!();
        println!("Exports");
        for line in export_lines {
            println!("{}", line);
        }
    }
    println!();
    output::print_summary(&items);

    if let Some(report) = &run.report {
        let json = serde_json::to_string_pretty(&Report {
            mode,
            items: &items,
        })?;
        std::fs::write(report, json)?;
    }

    Ok(())
}

/// Explicit `--config` must exist; otherwise `./config.toml` is used when present.
fn load_app_config(path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).is_file() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(AppConfig::default()),
    }
}

/// Expand directories into the image files they contain, sorted by path.
///
/// Files named explicitly are kept whatever their extension; intake rejects
/// the ones that are not images.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && media_type_of(entry.path()).is_some() {
                paths.push(entry.into_path());
            }
        }
    }
    Ok(paths)
}

fn media_type_of(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    split_extension(name).1.and_then(media_type_for_extension)
}

/// Read every file into a source. Files intake rejects are skipped with a warning.
fn read_sources(paths: &[PathBuf]) -> std::io::Result<Vec<SourceImage>> {
    let mut sources = Vec::new();
    for path in paths {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_of(path).unwrap_or("application/octet-stream");

        match SourceImage::new(name, media_type, bytes) {
            Ok(source) => sources.push(source),
            Err(err) => log::warn!("skipping {}: {err}", path.display()),
        }
    }
    Ok(sources)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
