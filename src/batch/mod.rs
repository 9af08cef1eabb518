// src/batch/mod.rs
use crate::extractors::{FilingExtraction, FilingExtractor};
use crate::storage::StorageManager;
use crate::utils::error::{AppError, StorageError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const DEFAULT_WORKERS: usize = 10;
pub const SUBMISSION_FILE: &str = "full-submission.txt";
const FORM_DIR: &str = "10-K";

/// One filing to process: `<ticker>/10-K/<filing_id>/full-submission.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingJob {
    pub ticker: String,
    pub filing_id: String,
    pub path: PathBuf,
}

impl FilingJob {
    /// Output stem, e.g. `AAPL_0000320193-23-000106`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.ticker.to_uppercase(), self.filing_id)
    }

    /// Builds a job for a single file outside the corpus walk. The filing id is
    /// the parent directory for `full-submission.txt`, otherwise the file stem.
    pub fn from_file(path: &Path, ticker: &str) -> Result<Self, AppError> {
        let stem_dir = if path.file_name().map_or(false, |n| n == SUBMISSION_FILE) {
            path.parent().and_then(|p| p.file_name())
        } else {
            path.file_stem()
        };
        let filing_id = stem_dir
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config(format!("Cannot derive a filing id from {}", path.display())))?;

        Ok(Self {
            ticker: ticker.to_string(),
            filing_id,
            path: path.to_path_buf(),
        })
    }
}

/// Walks `<input_dir>/<ticker>/10-K/<filing_id>/full-submission.txt`, sorted by
/// ticker then filing id. Directories without a submission file are skipped.
pub fn discover_filings(input_dir: &Path) -> Result<Vec<FilingJob>, AppError> {
    if !input_dir.is_dir() {
        return Err(AppError::Config(format!(
            "Input directory {} does not exist",
            input_dir.display()
        )));
    }

    let mut jobs = Vec::new();
    for ticker_dir in sorted_subdirs(input_dir)? {
        let form_dir = ticker_dir.join(FORM_DIR);
        if !form_dir.is_dir() {
            tracing::debug!("Skipping {}: no {} directory", ticker_dir.display(), FORM_DIR);
            continue;
        }
        let ticker = dir_name(&ticker_dir);
        for filing_dir in sorted_subdirs(&form_dir)? {
            let path = filing_dir.join(SUBMISSION_FILE);
            if path.is_file() {
                jobs.push(FilingJob {
                    ticker: ticker.clone(),
                    filing_id: dir_name(&filing_dir),
                    path,
                });
            } else {
                tracing::debug!("Skipping {}: no {}", filing_dir.display(), SUBMISSION_FILE);
            }
        }
    }

    tracing::info!("Discovered {} filings under {}", jobs.len(), input_dir.display());
    Ok(jobs)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Batch settings, built from the CLI arguments.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    pub workers: usize,
    pub write_toc_json: bool,
    pub offending_dir: Option<PathBuf>,
    pub debug: bool,
}

impl BatchConfig {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            workers: DEFAULT_WORKERS,
            write_toc_json: true,
            offending_dir: None,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilingStatus {
    Sectioned,
    Fallback,
    Failed,
}

impl FilingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Sectioned => "sectioned",
            FilingStatus::Fallback => "fallback",
            FilingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingOutcome {
    pub filing: String,
    pub status: FilingStatus,
}

/// Counts over one batch run, with outcomes in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<FilingOutcome>,
}

impl BatchSummary {
    pub fn count(&self, status: FilingStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Share of processed (non-failed) filings that fell back to "Full Document".
    pub fn fallback_ratio(&self) -> f64 {
        let processed = self.total() - self.count(FilingStatus::Failed);
        if processed == 0 {
            return 0.0;
        }
        self.count(FilingStatus::Fallback) as f64 / processed as f64
    }

    pub fn all_failed(&self) -> bool {
        self.total() > 0 && self.count(FilingStatus::Failed) == self.total()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} filings: {} sectioned, {} fallback, {} failed (fallback ratio {:.1}%)",
            self.total(),
            self.count(FilingStatus::Sectioned),
            self.count(FilingStatus::Fallback),
            self.count(FilingStatus::Failed),
            self.fallback_ratio() * 100.0
        )
    }
}

/// Processes every job with at most `config.workers` filings in flight.
///
/// Reads go through `tokio::fs`; extraction and persistence run on the
/// blocking pool. A failing filing never stops the batch.
pub async fn run_batch(jobs: Vec<FilingJob>, config: &BatchConfig) -> Result<BatchSummary, AppError> {
    let storage = Arc::new(StorageManager::new(&config.output_dir)?);
    storage.reset_missing_toc_log()?;

    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));
    let config = Arc::new(config.clone());
    let extractor = FilingExtractor::new();

    let mut handles = Vec::with_capacity(jobs.len());
    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        let storage = Arc::clone(&storage);
        let config = Arc::clone(&config);

        handles.push(tokio::spawn(async move {
            let name = job.name();
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("{}: failed: worker pool closed: {}", name, e);
                    return failed(name);
                }
            };

            let bytes = match tokio::fs::read(&job.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("{}: failed: cannot read {}: {}", name, job.path.display(), e);
                    return failed(name);
                }
            };

            let blocking = tokio::task::spawn_blocking(move || {
                process_filing(&extractor, &job, &bytes, &storage, &config)
            });
            match blocking.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("{}: failed: worker panicked: {}", name, e);
                    failed(name)
                }
            }
        }));
    }

    let mut summary = BatchSummary::default();
    for handle in handles {
        match handle.await {
            Ok(outcome) => summary.outcomes.push(outcome),
            Err(e) => return Err(AppError::Processing(format!("Batch task aborted: {}", e))),
        }
    }
    Ok(summary)
}

fn failed(filing: String) -> FilingOutcome {
    FilingOutcome { filing, status: FilingStatus::Failed }
}

/// Extracts and persists one filing, logging its status line.
pub fn process_filing(
    extractor: &FilingExtractor,
    job: &FilingJob,
    bytes: &[u8],
    storage: &StorageManager,
    config: &BatchConfig,
) -> FilingOutcome {
    let name = job.name();

    let extraction = match extractor.extract(&name, bytes) {
        Ok(extraction) => extraction,
        Err(e) => {
            tracing::error!("{}: failed: {}", name, e);
            return failed(name);
        }
    };

    if let Err(e) = persist(&extraction, job, bytes, storage, config) {
        tracing::error!("{}: failed: {}", name, e);
        return failed(name);
    }

    let status = match &extraction.toc {
        Some(toc) => {
            tracing::info!(
                "{}: sectioned ({} sections from {} TOC entries, {})",
                name,
                extraction.sections.len(),
                toc.len(),
                toc.origin
            );
            FilingStatus::Sectioned
        }
        None => {
            tracing::warn!("{}: fallback (no TOC found, kept as full document)", name);
            FilingStatus::Fallback
        }
    };
    FilingOutcome { filing: name, status }
}

fn persist(
    extraction: &FilingExtraction,
    job: &FilingJob,
    bytes: &[u8],
    storage: &StorageManager,
    config: &BatchConfig,
) -> Result<(), StorageError> {
    storage.save_sections(extraction)?;
    if let (Some(toc), true) = (&extraction.toc, config.write_toc_json) {
        storage.save_toc(toc)?;
    }
    storage.save_metadata(extraction)?;

    if extraction.is_fallback() {
        storage.record_missing_toc(&extraction.filing)?;
        if let Some(dir) = &config.offending_dir {
            storage.copy_offending(&job.path, dir, &extraction.filing)?;
        }
    }

    if config.debug {
        let content = String::from_utf8_lossy(bytes);
        if let Err(e) = storage.save_debug(extraction, &content) {
            tracing::warn!("{}: could not write debug artifacts: {}", extraction.filing, e);
        }
    }
    Ok(())
}
