// src/toc/model.rs
use serde::Serialize;
use std::fmt;

/// One structural line of a filing's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub part: Option<String>,  // e.g., "PART I", inherited until the next part header
    pub item: Option<String>,  // e.g., "ITEM 1A"; None for index-style lines
    pub title: String,         // e.g., "Risk Factors"; never empty
    pub page: Option<String>,  // raw page token, not necessarily numeric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>, // href of the row's link, when the TOC was a linked table
}

impl TocEntry {
    pub fn item(part: Option<String>, item: String, title: String, page: Option<String>) -> Self {
        Self { part, item: Some(item), title, page, anchor: None }
    }

    pub fn index(part: Option<String>, title: String, page: Option<String>) -> Self {
        Self { part, item: None, title, page, anchor: None }
    }

    pub fn with_anchor(mut self, anchor: Option<String>) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Which strategy produced a [`TocResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TocOrigin {
    Table,
    CaptionTable,
    LineScan,
}

impl TocOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TocOrigin::Table => "table",
            TocOrigin::CaptionTable => "caption-table",
            TocOrigin::LineScan => "line-scan",
        }
    }
}

impl fmt::Display for TocOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered TOC entries for one filing, tagged for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocResult {
    pub filing: String,
    pub origin: TocOrigin,
    pub entries: Vec<TocEntry>,
}

impl TocResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.title.as_str())
    }
}
