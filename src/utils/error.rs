// src/utils/error.rs
use thiserror::Error;

// Errors raised while turning one filing into a TOC and sections.
// Only `UnreadableInput` ever fails a filing; the rest are recovered where they occur.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("TOC not found for {0}")]
    TocNotFound(String),

    #[error("Malformed TOC row {row} in {filing}: {reason}")]
    MalformedTocRow {
        filing: String,
        row: usize,
        reason: String,
    },

    #[error("Empty TOC entry title in {filing}: '{line}'")]
    EmptyEntryTitle { filing: String, line: String },

    #[error("Unreadable input for {filing}: {reason}")]
    UnreadableInput { filing: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
