//! payslipmerge: merge payslip PDFs into one date-sorted document.
//!
//! The library discovers PDF files in a directory, extracts the payment
//! date from each (text layer first, OCR fallback), drops duplicate
//! dates, and merges the remainder into a single output PDF in ascending
//! date order. Extraction results are cached in SQLite keyed by a
//! content-independent file fingerprint, so repeat runs skip the
//! expensive OCR step.
//!
//! # Architecture
//!
//! - [`cli`]: Command-line argument definitions (clap derive)
//! - [`cache`]: Persistent extracted-date cache (rusqlite + blake3)
//! - [`extract`]: Date extraction from PDFs (pdf-extract, OCR, regex)
//! - [`pipeline`]: Batch orchestration, page splitting, and PDF merge (lopdf)
//! - [`report`]: Progress and log callback traits plus console frontends
//! - [`signal`]: Ctrl+C handling via a shared cancellation flag
//! - [`error`]: Exit codes and structured error output
//! - [`logging`]: env_logger setup

pub mod cache;
pub mod cli;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod signal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::cache::{default_cache_path, DateCache};
use crate::cli::Cli;
use crate::error::ExitCode;
use crate::extract::OcrEngine;
use crate::pipeline::{Pipeline, PipelineConfig, RunSummary};
use crate::report::{ConsoleLog, Progress};
use crate::signal::{create_handler, install_handler};

/// Default output location relative to the input directory.
const DEFAULT_OUTPUT_SUBDIR: &str = "output";
const DEFAULT_OUTPUT_NAME: &str = "arranged_payslips.pdf";

/// Run the application with parsed CLI arguments.
///
/// Returns the exit code to report, or an error for fatal failures the
/// caller should print before exiting non-zero.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if !OcrEngine::is_available() {
        log::warn!(
            "pdftoppm or tesseract not found on PATH; \
             pages without a text layer cannot be read"
        );
    }

    let handler = match install_handler() {
        Ok(handler) => handler,
        Err(e) => {
            log::warn!("Could not install Ctrl+C handler: {}", e);
            create_handler()
        }
    };

    let output_path = cli.output.clone().unwrap_or_else(|| {
        cli.input_dir
            .join(DEFAULT_OUTPUT_SUBDIR)
            .join(DEFAULT_OUTPUT_NAME)
    });

    let cache = open_cache(&cli)?;

    let progress = Arc::new(Progress::new(cli.quiet));
    let mut config = PipelineConfig::default()
        .with_split_pages(cli.split_pages)
        .with_cancel_flag(handler.get_flag())
        .with_progress_callback(progress.clone())
        .with_log_callback(Arc::new(ConsoleLog));
    if let Some(cache) = cache {
        config = config.with_cache(cache);
    }

    let mut pipeline = Pipeline::new(config);
    let run_result = pipeline.run(&cli.input_dir, &output_path);
    progress.finish();

    let summary = run_result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(exit_code_for(&summary))
}

/// Open the extracted-date cache per the CLI flags.
///
/// `--no-cache` disables it entirely; `--clear-cache` starts from an
/// empty mapping that overwrites the database on save.
fn open_cache(cli: &Cli) -> Result<Option<DateCache>> {
    if cli.no_cache {
        log::debug!("Date cache disabled");
        return Ok(None);
    }

    let path: PathBuf = match &cli.cache {
        Some(path) => path.clone(),
        None => default_cache_path()?,
    };

    let cache = if cli.clear_cache {
        log::info!("Clearing date cache at {}", path.display());
        DateCache::empty(&path)
    } else {
        DateCache::open(&path)
    };

    Ok(Some(cache))
}

/// Map a run summary onto the process exit code.
fn exit_code_for(summary: &RunSummary) -> ExitCode {
    if summary.cancelled {
        ExitCode::Interrupted
    } else if summary.output.is_none() {
        ExitCode::NoPayslips
    } else if summary.errors > 0 || summary.without_date > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}
