// src/storage/mod.rs
use crate::extractors::FilingExtraction;
use crate::toc::TocResult;
use crate::utils::error::StorageError;
use crate::utils::html_debug;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const TOC_DIR: &str = "tocs";
const DEBUG_DIR: &str = "debug";
const MISSING_TOC_LOG: &str = "missing_toc.log";

pub struct StorageManager {
    base_dir: PathBuf,
    missing_log_lock: Mutex<()>,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
            missing_log_lock: Mutex::new(()),
        })
    }

    pub fn missing_toc_log_path(&self) -> PathBuf {
        self.base_dir.join(MISSING_TOC_LOG)
    }

    fn subdir(&self, name: &str) -> Result<PathBuf, StorageError> {
        let dir = self.base_dir.join(name);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(StorageError::IoError)?;
        }
        Ok(dir)
    }

    /// Saves the sections as `<name>.txt`, each introduced by a `### TITLE ###` line.
    pub fn save_sections(&self, extraction: &FilingExtraction) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}.txt", extraction.filing));

        let mut out = String::new();
        for (title, text) in extraction.sections.iter() {
            out.push_str(&format!("### {} ###\n{}\n\n", title.to_uppercase(), text));
        }
        fs::write(&file_path, out).map_err(StorageError::IoError)?;

        tracing::debug!("Saved {} sections to {}", extraction.sections.len(), file_path.display());
        Ok(file_path)
    }

    /// Saves the TOC entries as a JSON list under `tocs/<name>_toc.json`.
    pub fn save_toc(&self, toc: &TocResult) -> Result<PathBuf, StorageError> {
        let file_path = self.subdir(TOC_DIR)?.join(format!("{}_toc.json", toc.filing));

        let toc_str = serde_json::to_string_pretty(&toc.entries)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, toc_str).map_err(StorageError::IoError)?;

        tracing::debug!("Saved TOC to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the extraction in JSON format
    pub fn save_metadata(&self, extraction: &FilingExtraction) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}_meta.json", extraction.filing));

        let metadata = serde_json::json!({
            "filing": extraction.filing,
            "format": extraction.format,
            "toc_origin": extraction.toc.as_ref().map(|t| t.origin),
            "toc_entries": extraction.toc.as_ref().map_or(0, |t| t.len()),
            "fallback": extraction.is_fallback(),
            "sections": extraction.sections.keys().collect::<Vec<_>>(),
            "content_length": extraction.sections.iter().map(|(_, text)| text.len()).sum::<usize>(),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::debug!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }

    /// Empties the missing-TOC log so it only lists filings from the current run.
    pub fn reset_missing_toc_log(&self) -> Result<(), StorageError> {
        let _guard = self.missing_log_lock.lock().unwrap_or_else(|e| e.into_inner());
        fs::write(self.missing_toc_log_path(), "").map_err(StorageError::IoError)
    }

    /// Appends `<name>.txt` to the missing-TOC log.
    pub fn record_missing_toc(&self, filing: &str) -> Result<(), StorageError> {
        let _guard = self.missing_log_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.missing_toc_log_path())
            .map_err(StorageError::IoError)?;
        writeln!(file, "{}.txt", filing).map_err(StorageError::IoError)
    }

    /// Copies a filing's source file into `dir` as `<name>.txt` for later inspection.
    pub fn copy_offending(&self, source: &Path, dir: &Path, filing: &str) -> Result<PathBuf, StorageError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(StorageError::IoError)?;
        }
        let dest = dir.join(format!("{}.txt", filing));
        fs::copy(source, &dest).map_err(StorageError::IoError)?;
        tracing::info!("Copied: {} -> {}", source.display(), dest.display());
        Ok(dest)
    }

    /// Writes the debug artifacts of one filing under `debug/`: the TOC entries
    /// as readable lines and, for HTML filings, an annotated copy of the source.
    pub fn save_debug(&self, extraction: &FilingExtraction, content: &str) -> Result<(), StorageError> {
        let debug_dir = self.subdir(DEBUG_DIR)?;

        let mut lines = String::from("=== TOC ENTRIES ===\n");
        match &extraction.toc {
            Some(toc) => {
                lines.push_str(&format!("origin: {}\n", toc.origin));
                for entry in &toc.entries {
                    lines.push_str(&format!(
                        "{} | {} | {} | {}\n",
                        entry.part.as_deref().unwrap_or("-"),
                        entry.item.as_deref().unwrap_or("-"),
                        entry.title,
                        entry.page.as_deref().unwrap_or("-"),
                    ));
                }
            }
            None => lines.push_str("(no TOC found)\n"),
        }
        lines.push_str("\n=== SECTIONS ===\n");
        for (title, text) in extraction.sections.iter() {
            lines.push_str(&format!("{} ({} bytes)\n", title, text.len()));
        }
        fs::write(debug_dir.join(format!("{}_toc_lines.txt", extraction.filing)), lines)
            .map_err(StorageError::IoError)?;

        if extraction.format == crate::document::DocumentFormat::Html {
            let path = debug_dir.join(format!("{}_annotated.html", extraction.filing));
            html_debug::save_annotated_html(content, extraction.toc.as_ref(), &path)?;
        }
        Ok(())
    }
}
