// src/toc/strategy.rs
use crate::document::{DocumentFormat, ParsedDocument, RawDocument};
use crate::toc::locate::{locate_toc_lines, locate_toc_table};
use crate::toc::model::{TocEntry, TocOrigin, TocResult};
use crate::toc::parse::{parse_table_rows, parse_table_text, parse_toc_lines};
use crate::utils::error::ExtractError;

/// One self-contained way of finding and parsing a filing's TOC.
///
/// Strategies are pure: they only read the parsed document. A strategy that
/// finds nothing returns `TocNotFound` and the selector moves on.
pub trait TocStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn origin(&self) -> TocOrigin;

    fn extract(&self, document: &ParsedDocument, filing: &str) -> Result<Vec<TocEntry>, ExtractError>;
}

/// TOC table read as free text, split on ITEM boundaries.
pub struct TableCaptionStrategy;

/// TOC table read row by row (title cell, page cell, link anchor).
pub struct TableRowStrategy;

/// Marker line followed by item/part header lines.
pub struct LineScanStrategy;

impl TocStrategy for TableCaptionStrategy {
    fn name(&self) -> &'static str {
        "table-caption"
    }

    fn origin(&self) -> TocOrigin {
        TocOrigin::CaptionTable
    }

    fn extract(&self, document: &ParsedDocument, filing: &str) -> Result<Vec<TocEntry>, ExtractError> {
        let html = document.html().ok_or_else(|| not_found(filing))?;
        let table = locate_toc_table(html).ok_or_else(|| not_found(filing))?;
        non_empty(parse_table_text(table, filing), filing)
    }
}

impl TocStrategy for TableRowStrategy {
    fn name(&self) -> &'static str {
        "table-row"
    }

    fn origin(&self) -> TocOrigin {
        TocOrigin::Table
    }

    fn extract(&self, document: &ParsedDocument, filing: &str) -> Result<Vec<TocEntry>, ExtractError> {
        let html = document.html().ok_or_else(|| not_found(filing))?;
        let table = locate_toc_table(html).ok_or_else(|| not_found(filing))?;
        non_empty(parse_table_rows(table, filing), filing)
    }
}

impl TocStrategy for LineScanStrategy {
    fn name(&self) -> &'static str {
        "line-scan"
    }

    fn origin(&self) -> TocOrigin {
        TocOrigin::LineScan
    }

    fn extract(&self, document: &ParsedDocument, filing: &str) -> Result<Vec<TocEntry>, ExtractError> {
        let region = locate_toc_lines(document.body().blocks(), filing)?;
        non_empty(parse_toc_lines(&region.lines, filing), filing)
    }
}

fn not_found(filing: &str) -> ExtractError {
    ExtractError::TocNotFound(filing.to_string())
}

fn non_empty(entries: Vec<TocEntry>, filing: &str) -> Result<Vec<TocEntry>, ExtractError> {
    if entries.is_empty() {
        Err(not_found(filing))
    } else {
        Ok(entries)
    }
}

/// Runs strategies in priority order; the first non-empty result wins.
pub struct StrategySelector {
    strategies: Vec<Box<dyn TocStrategy>>,
}

impl StrategySelector {
    pub fn new(strategies: Vec<Box<dyn TocStrategy>>) -> Self {
        Self { strategies }
    }

    /// Table strategies first for HTML; text and unknown content only get the line scan.
    pub fn for_format(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Html => Self::new(vec![
                Box::new(TableCaptionStrategy),
                Box::new(TableRowStrategy),
                Box::new(LineScanStrategy),
            ]),
            DocumentFormat::Plaintext | DocumentFormat::Unknown => Self::new(vec![Box::new(LineScanStrategy)]),
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn select(&self, document: &ParsedDocument, filing: &str) -> Result<TocResult, ExtractError> {
        for strategy in &self.strategies {
            match strategy.extract(document, filing) {
                Ok(entries) => {
                    tracing::info!(
                        "{}: TOC found by {} strategy ({} entries)",
                        filing,
                        strategy.name(),
                        entries.len()
                    );
                    return Ok(TocResult {
                        filing: filing.to_string(),
                        origin: strategy.origin(),
                        entries,
                    });
                }
                Err(e) => {
                    tracing::debug!("{}: {} strategy failed: {}", filing, strategy.name(), e);
                }
            }
        }

        tracing::warn!(
            "{}: TOC not found (tried {})",
            filing,
            self.strategy_names().join(", ")
        );
        Err(not_found(filing))
    }
}

/// Locates and parses the TOC of `content` without any other processing.
pub fn locate_and_parse_toc(
    content: &str,
    format: DocumentFormat,
    filing: &str,
) -> Result<TocResult, ExtractError> {
    let raw = RawDocument::new(content, format);
    let parsed = ParsedDocument::parse(&raw);
    StrategySelector::for_format(format).select(&parsed, filing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(item: Option<&str>, title: &str, page: Option<&str>) -> (Option<String>, String, Option<String>) {
        (item.map(str::to_string), title.to_string(), page.map(str::to_string))
    }

    fn shape(result: &TocResult) -> Vec<(Option<String>, String, Option<String>)> {
        result
            .entries
            .iter()
            .map(|e| (e.item.clone(), e.title.clone(), e.page.clone()))
            .collect()
    }

    #[test]
    fn plaintext_toc_via_line_scan() {
        let text = "TABLE OF CONTENTS\nITEM 1. Business 4\nITEM 1A. Risk Factors 9\nSIGNATURES";
        let result = locate_and_parse_toc(text, DocumentFormat::Plaintext, "AAPL_0001").unwrap();
        assert_eq!(result.origin, TocOrigin::LineScan);
        assert_eq!(result.filing, "AAPL_0001");
        assert_eq!(
            shape(&result),
            vec![
                entry(Some("ITEM 1"), "Business", Some("4")),
                entry(Some("ITEM 1A"), "Risk Factors", Some("9")),
            ]
        );
        assert!(result.entries.iter().all(|e| e.part.is_none()));
    }

    #[test]
    fn caption_table_with_linked_rows_falls_through_to_row_mode() {
        let html = "<html><body><table><caption>Table of Contents</caption>\
            <tr><td><a href='#i1'>Business</a></td><td>4</td></tr>\
            <tr><td><a href='#i1a'>Risk Factors</a></td><td>9</td></tr>\
            </table><p>Business</p><p>We sell things.</p></body></html>";
        let result = locate_and_parse_toc(html, DocumentFormat::Html, "MSFT_0002").unwrap();
        assert_eq!(result.origin, TocOrigin::Table);
        assert_eq!(
            shape(&result),
            vec![entry(None, "Business", Some("4")), entry(None, "Risk Factors", Some("9"))]
        );
    }

    #[test]
    fn caption_strategy_wins_when_items_are_present() {
        let html = "<html><body><table><tr><td>TABLE OF CONTENTS</td></tr>\
            <tr><td>Item 1.</td><td>Business</td><td>4</td></tr>\
            <tr><td>Item 1A.</td><td>Risk Factors</td><td>9</td></tr>\
            </table></body></html>";
        let result = locate_and_parse_toc(html, DocumentFormat::Html, "CAP").unwrap();
        assert_eq!(result.origin, TocOrigin::CaptionTable);
        assert_eq!(
            shape(&result),
            vec![
                entry(Some("ITEM 1"), "Business", Some("4")),
                entry(Some("ITEM 1A"), "Risk Factors", Some("9")),
            ]
        );
    }

    #[test]
    fn html_without_toc_table_uses_line_scan() {
        let html = "<html><body><p>Table of Contents</p>\
            <div>Item 1. Business 4</div><div>Item 2. Properties 12</div>\
            <p>Exhibits</p></body></html>";
        let result = locate_and_parse_toc(html, DocumentFormat::Html, "LS").unwrap();
        assert_eq!(result.origin, TocOrigin::LineScan);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn no_marker_means_not_found() {
        let text = "ITEM 1. Business\nWe make widgets.\nITEM 2. Properties";
        let err = locate_and_parse_toc(text, DocumentFormat::Plaintext, "XOM_0003").unwrap_err();
        assert_eq!(err, ExtractError::TocNotFound("XOM_0003".to_string()));
    }

    #[test]
    fn unknown_format_only_line_scans() {
        let selector = StrategySelector::for_format(DocumentFormat::Unknown);
        assert_eq!(selector.strategy_names(), vec!["line-scan"]);
        let selector = StrategySelector::for_format(DocumentFormat::Html);
        assert_eq!(selector.strategy_names(), vec!["table-caption", "table-row", "line-scan"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Cover\nTable of Contents\nPART I\nItem 1. Business 3\nPART II\nItem 5. Market 20\nExhibits";
        let first = locate_and_parse_toc(text, DocumentFormat::Plaintext, "IDEM").unwrap();
        let second = locate_and_parse_toc(text, DocumentFormat::Plaintext, "IDEM").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
