// src/lib.rs
pub mod batch;
pub mod document;
pub mod extractors;
pub mod storage;
pub mod toc;
pub mod utils;

pub use document::{sniff_format, DocumentFormat};
pub use extractors::{segment_sections, FilingExtraction, FilingExtractor, SectionMap};
pub use toc::{locate_and_parse_toc, TocEntry, TocOrigin, TocResult};
pub use utils::error::{AppError, ExtractError, StorageError};
