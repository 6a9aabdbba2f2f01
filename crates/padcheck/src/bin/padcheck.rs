//! `padcheck` command-line tool.
//!
//! Detect pads in an image, capture and delete references, and validate
//! single frames or a directory of frames against a stored reference.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

use padcheck::detect::{detect_pads_in_file, DetectError, DirectoryFrameSource};
use padcheck::validate::{StoreIoError, WatchOptions, Watcher};
use padcheck::{
    capture_reference, score_reference_match, validate_against_template, BoardSide,
    ConfigIoError, PadDetection, PadDetector, PadcheckConfig, ReferenceKey, ReferenceLibrary,
    ReferenceStore, TemplateLibrary, ValidationError, ValidationResult, ValidationSession,
};

#[cfg(not(feature = "tracing"))]
use log::{info, LevelFilter};
#[cfg(feature = "tracing")]
use tracing::info;

/// Exit status of `validate` when the board fails inspection.
const EXIT_VALIDATION_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "padcheck", version, about = "Gap pad placement inspection", long_about = None)]
struct Cli {
    /// JSON file with detector and validation parameters
    #[arg(long, global = true, value_name = "JSON")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct BoardArgs {
    /// Board serial number (case-insensitive)
    #[arg(long)]
    serial: String,

    /// Board side: front or back
    #[arg(long)]
    side: BoardSide,

    /// Reference library JSON file
    #[arg(long, value_name = "JSON")]
    store: PathBuf,
}

impl BoardArgs {
    fn key(&self) -> Result<ReferenceKey, ValidationError> {
        ReferenceKey::new(&self.serial, self.side)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect pads in an image and print the detection report
    Detect {
        #[arg(long)]
        image: PathBuf,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Detect pads in an image and store them as the reference for a board
    Capture {
        #[arg(long)]
        image: PathBuf,

        #[command(flatten)]
        board: BoardArgs,

        /// Store the reference even when no pads are detected
        #[arg(long)]
        allow_empty: bool,
    },

    /// Validate one image against the stored reference
    Validate {
        #[arg(long)]
        image: PathBuf,

        #[command(flatten)]
        board: BoardArgs,

        /// Template library JSON; enables the template pad-count check
        #[arg(long, requires_all = ["product", "variant"])]
        templates: Option<PathBuf>,

        #[arg(long, requires = "templates")]
        product: Option<String>,

        #[arg(long, requires = "templates")]
        variant: Option<String>,
    },

    /// Validate frames from a directory on a fixed period, one JSON result per line
    Watch {
        /// Directory of frames, cycled in name order
        #[arg(long)]
        frames: PathBuf,

        #[command(flatten)]
        board: BoardArgs,

        /// Poll period; defaults to the configured period (2000 ms)
        #[arg(long)]
        period_ms: Option<u64>,

        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<usize>,
    },

    /// Delete the stored reference for a board
    Delete {
        #[command(flatten)]
        board: BoardArgs,
    },

    /// List the products and variants of a template library
    Templates {
        #[arg(long)]
        templates: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("config: {0}")]
    Config(#[from] ConfigIoError),
    #[error("store: {0}")]
    Store(#[from] StoreIoError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error("no template '{variant}' for product '{product}'")]
    TemplateNotFound { product: String, variant: String },
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
}

#[derive(Serialize)]
struct DetectReport<'a> {
    image: String,
    #[serde(flatten)]
    detection: &'a PadDetection,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("padcheck: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) -> Result<(), CliError> {
    #[cfg(not(feature = "tracing"))]
    {
        let level = match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        };
        padcheck::core::init_with_level(level)?;
    }
    #[cfg(feature = "tracing")]
    {
        let _ = verbose;
        padcheck::core::init_tracing(false);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    init_logging(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => PadcheckConfig::load_json(path)?,
        None => PadcheckConfig::default(),
    };
    let detector = PadDetector::new(config.detector.clone());

    match cli.command {
        Command::Detect { image, output } => {
            run_detect(&detector, &image, output.as_deref())?;
        }
        Command::Capture {
            image,
            board,
            allow_empty,
        } => run_capture(&detector, &image, &board, allow_empty)?,
        Command::Validate {
            image,
            board,
            templates,
            product,
            variant,
        } => {
            let template = match (templates, product, variant) {
                (Some(lib), Some(product), Some(variant)) => Some((lib, product, variant)),
                _ => None,
            };
            let result = run_validate(&detector, &config, &image, &board, template)?;
            print_json(&result)?;
            if result.status.is_fail() {
                return Ok(ExitCode::from(EXIT_VALIDATION_FAILED));
            }
        }
        Command::Watch {
            frames,
            board,
            period_ms,
            max_ticks,
        } => {
            let period = period_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.validation.poll_period());
            run_watch(detector, &config, &frames, &board, WatchOptions { period, max_ticks })?;
        }
        Command::Delete { board } => run_delete(&board)?,
        Command::Templates { templates } => {
            let lib = TemplateLibrary::load_json(&templates)?;
            print_json(&lib.list())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// One compact JSON document per line, flushed so consumers see it at once.
fn write_json_line<T: Serialize>(value: &T) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()
}

fn run_detect(
    detector: &PadDetector,
    image: &Path,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let detection = detect_pads_in_file(image, detector);
    let report = DetectReport {
        image: image.display().to_string(),
        detection: &detection,
    };
    match output {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
            info!(
                "wrote {} candidates to {}",
                detection.candidates.len(),
                path.display()
            );
        }
        None => print_json(&report)?,
    }
    Ok(())
}

fn run_capture(
    detector: &PadDetector,
    image: &Path,
    board: &BoardArgs,
    allow_empty: bool,
) -> Result<(), CliError> {
    let key = board.key()?;
    let detection = detect_pads_in_file(image, detector);
    let record = capture_reference(
        &key,
        Some(image.display().to_string()),
        detection.candidates,
        allow_empty,
    )?;

    let mut lib = ReferenceLibrary::load_or_default(&board.store)?;
    if lib.insert(record.clone()).is_some() {
        info!("replaced existing reference {key}");
    }
    lib.write_json(&board.store)?;
    print_json(&record)
}

fn run_validate(
    detector: &PadDetector,
    config: &PadcheckConfig,
    image: &Path,
    board: &BoardArgs,
    template: Option<(PathBuf, String, String)>,
) -> Result<ValidationResult, CliError> {
    let key = board.key()?;
    let lib = ReferenceLibrary::load_json(&board.store)?;
    let record = lib
        .get(&key)
        .ok_or_else(|| ValidationError::NoReferenceFound(key.clone()))?;
    if record.pads.is_empty() {
        return Err(ValidationError::EmptyReferencePads.into());
    }

    let detected = detect_pads_in_file(image, detector).candidates;
    let result = match template {
        Some((path, product, variant)) => {
            let templates = TemplateLibrary::load_json(&path)?;
            let layout = templates
                .get(&product, &variant)
                .ok_or(CliError::TemplateNotFound { product, variant })?;
            validate_against_template(layout, &record.pads, &detected, &config.validation)?
        }
        None => score_reference_match(&record.pads, &detected, &config.validation),
    };
    info!("{key}: {} ({})", result.status, result.message);
    Ok(result)
}

fn run_watch(
    detector: PadDetector,
    config: &PadcheckConfig,
    frames: &Path,
    board: &BoardArgs,
    options: WatchOptions,
) -> Result<(), CliError> {
    let key = board.key()?;
    let lib = ReferenceLibrary::load_json(&board.store)?;
    let mut session = ValidationSession::new(config.validation.clone());
    session.start(&lib, &key)?;
    let source = DirectoryFrameSource::new(frames)?;

    let watcher = Watcher::spawn(
        Arc::new(Mutex::new(session)),
        detector,
        source,
        options,
        |result: &ValidationResult| {
            if let Err(err) = write_json_line(result) {
                log::warn!("cannot write result: {err}");
            }
        },
    );
    let summary = watcher.join();
    info!(
        "watch finished: {} ticks, {} published, {} failed, {} dropped",
        summary.ticks, summary.published, summary.failed, summary.dropped
    );
    Ok(())
}

fn run_delete(board: &BoardArgs) -> Result<(), CliError> {
    let key = board.key()?;
    let mut lib = ReferenceLibrary::load_json(&board.store)?;
    if lib.remove(&key).is_none() {
        return Err(ValidationError::NoReferenceFound(key).into());
    }
    lib.write_json(&board.store)?;
    info!("deleted reference {key}");
    println!("deleted {key}");
    Ok(())
}
