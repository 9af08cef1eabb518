// src/extractors/pipeline.rs
use crate::document::{DocumentFormat, ParsedDocument, RawDocument};
use crate::extractors::section::{segment_sections, SectionMap};
use crate::toc::{StrategySelector, TocResult};
use crate::utils::error::ExtractError;

/// Everything one extraction call produces for a filing.
#[derive(Debug, Clone)]
pub struct FilingExtraction {
    pub filing: String,
    pub format: DocumentFormat,
    pub toc: Option<TocResult>, // None when every strategy failed
    pub sections: SectionMap,
}

impl FilingExtraction {
    /// True when no TOC was found and the body was kept as one section.
    pub fn is_fallback(&self) -> bool {
        self.toc.is_none()
    }
}

/// Runs the per-filing pipeline: sniff, parse, TOC strategies, segmentation.
///
/// Holds no per-filing state, so one instance can serve every worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilingExtractor;

impl FilingExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, filing: &str, content: &[u8]) -> Result<FilingExtraction, ExtractError> {
        let raw = RawDocument::from_bytes(filing, content)?;
        Ok(self.extract_document(filing, &raw))
    }

    pub fn extract_document(&self, filing: &str, raw: &RawDocument) -> FilingExtraction {
        tracing::debug!("{}: extracting {} document ({} bytes)", filing, raw.format(), raw.content().len());

        let parsed = ParsedDocument::parse(raw);
        let toc = StrategySelector::for_format(raw.format())
            .select(&parsed, filing)
            .ok();

        let sections = segment_sections(parsed.body(), toc.as_ref());
        match &toc {
            Some(toc) => tracing::debug!(
                "{}: {} sections from {} TOC entries ({})",
                filing,
                sections.len(),
                toc.len(),
                toc.origin
            ),
            None => tracing::debug!("{}: falling back to full document", filing),
        }

        FilingExtraction {
            filing: filing.to_string(),
            format: raw.format(),
            toc,
            sections,
        }
    }
}
