// src/main.rs
use clap::Parser;
use sec_sectioner::batch::{self, BatchConfig, FilingJob, DEFAULT_WORKERS};
use sec_sectioner::utils::{self, AppError};
use std::path::PathBuf;

const WORKERS_ENV: &str = "SECTIONER_WORKERS";

/// Command Line Interface for the 10-K section extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Corpus root laid out as <ticker>/10-K/<filing_id>/full-submission.txt
    #[arg(short, long, default_value = "sec-edgar-filings")]
    input_dir: PathBuf,

    /// Process a single filing instead of the whole corpus
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Ticker used to name the output of --file
    #[arg(short, long, default_value = "UNKNOWN")]
    ticker: String,

    /// Output directory for sectioned reports
    #[arg(short, long, default_value = "cleaned_10k_reports")]
    output_dir: PathBuf,

    /// Number of filings processed concurrently (falls back to SECTIONER_WORKERS, then 10)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Skip writing tocs/<name>_toc.json
    #[arg(long)]
    no_toc_json: bool,

    /// Copy the source of every filing without a TOC into this directory
    #[arg(long)]
    offending_dir: Option<PathBuf>,

    /// Debug mode - save annotated HTML and TOC listings under <output>/debug
    #[arg(short, long)]
    debug: bool,
}

fn resolve_workers(flag: Option<usize>) -> Result<usize, AppError> {
    if let Some(workers) = flag {
        return Ok(workers);
    }
    match std::env::var(WORKERS_ENV) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", WORKERS_ENV, value, e))),
        Err(_) => Ok(DEFAULT_WORKERS),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    let workers = resolve_workers(args.workers)?;
    if workers == 0 {
        return Err(AppError::Config("Worker count must be at least 1".to_string()));
    }

    let config = BatchConfig {
        output_dir: args.output_dir.clone(),
        workers,
        write_toc_json: !args.no_toc_json,
        offending_dir: args.offending_dir.clone(),
        debug: args.debug,
    };

    // 3. Collect the filings to process
    let jobs = match &args.file {
        Some(path) => vec![FilingJob::from_file(path, &args.ticker)?],
        None => batch::discover_filings(&args.input_dir)?,
    };
    if jobs.is_empty() {
        return Err(AppError::Config(format!(
            "No filings found under {}",
            args.input_dir.display()
        )));
    }

    // 4. Run the batch
    tracing::info!("Processing {} filings with {} workers", jobs.len(), workers);
    let summary = batch::run_batch(jobs, &config).await?;

    tracing::info!("Processing finished. {}", summary);
    tracing::info!(
        "Missing-TOC filings listed in {}",
        config.output_dir.join("missing_toc.log").display()
    );

    if summary.all_failed() {
        return Err(AppError::Processing(format!(
            "Failed to section any of {} filings",
            summary.total()
        )));
    }

    Ok(())
}
