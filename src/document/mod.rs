// src/document/mod.rs
pub mod body;
pub mod sniff;

pub use body::Body;
pub use sniff::{sniff_format, DocumentFormat};

use crate::utils::error::ExtractError;
use scraper::Html;

/// One filing's content as read from disk. Immutable once built.
#[derive(Debug, Clone)]
pub struct RawDocument {
    content: String,
    format: DocumentFormat,
}

impl RawDocument {
    pub fn new(content: impl Into<String>, format: DocumentFormat) -> Self {
        Self { content: content.into(), format }
    }

    /// Sniffs and decodes raw bytes. Empty and binary content is unreadable;
    /// anything else is kept, with invalid UTF-8 replaced.
    pub fn from_bytes(filing: &str, bytes: &[u8]) -> Result<Self, ExtractError> {
        if sniff::is_blank(bytes) {
            return Err(ExtractError::UnreadableInput {
                filing: filing.to_string(),
                reason: "content is empty".to_string(),
            });
        }
        if sniff::looks_binary(bytes) {
            return Err(ExtractError::UnreadableInput {
                filing: filing.to_string(),
                reason: "content looks binary (NUL bytes)".to_string(),
            });
        }

        let format = sniff_format(bytes);
        let content = String::from_utf8_lossy(bytes).into_owned();
        tracing::debug!("{}: sniffed format {} ({} bytes)", filing, format, bytes.len());
        Ok(Self { content, format })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// A filing parsed once and shared by every TOC strategy and the segmenter.
pub struct ParsedDocument {
    format: DocumentFormat,
    html: Option<Html>,
    body: Body,
}

impl ParsedDocument {
    pub fn parse(raw: &RawDocument) -> Self {
        match raw.format() {
            DocumentFormat::Html => {
                let html = Html::parse_document(raw.content());
                let body = Body::from_html(&html);
                Self { format: raw.format(), html: Some(html), body }
            }
            DocumentFormat::Plaintext | DocumentFormat::Unknown => Self {
                format: raw.format(),
                html: None,
                body: Body::from_text(raw.content()),
            },
        }
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn html(&self) -> Option<&Html> {
        self.html.as_ref()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}
