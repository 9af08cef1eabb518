// src/toc/locate.rs
use crate::toc::patterns::{
    element_text, normalize_item, ITEM_CANDIDATE_RE, PART_HEADER_RE, TOC_MARKER_RE,
    TOC_TERMINATOR_RE,
};
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to compile TABLE_SELECTOR"));

static CAPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("caption").expect("Failed to compile CAPTION_SELECTOR"));

/// Finds the first table, in document order, whose text or caption carries a
/// TOC marker. A matching table nested inside the hit (layout wrappers) wins
/// over its container.
pub fn locate_toc_table(document: &Html) -> Option<ElementRef<'_>> {
    let first = document.select(&TABLE_SELECTOR).find(|table| is_toc_table(*table))?;
    let mut current = first;
    loop {
        let scope = current;
        let inner = scope
            .select(&TABLE_SELECTOR)
            .find(|table| table.id() != scope.id() && is_toc_table(*table));
        match inner {
            Some(inner) => {
                tracing::trace!("Descending into nested TOC table");
                current = inner;
            }
            None => return Some(current),
        }
    }
}

fn is_toc_table(table: ElementRef<'_>) -> bool {
    let caption_hit = table
        .select(&CAPTION_SELECTOR)
        .any(|caption| TOC_MARKER_RE.is_match(&element_text(caption)));
    caption_hit || TOC_MARKER_RE.is_match(&element_text(table))
}

/// The slice of a line-oriented document that looked like a TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocRegion {
    pub start: usize,
    pub end: Option<usize>,
    /// Candidate header lines only, trimmed, in order.
    pub lines: Vec<String>,
}

/// Line-scan locator.
///
/// Starts after the first TOC marker line and keeps only lines that look like
/// item or part headers. The region ends at a "Signatures"/"Exhibits" line, or
/// at an item header that was already collected (the scan has left the TOC
/// and reached the body headings).
pub fn locate_toc_lines<S: AsRef<str>>(lines: &[S], filing: &str) -> Result<TocRegion, ExtractError> {
    let start = lines
        .iter()
        .position(|line| TOC_MARKER_RE.is_match(line.as_ref()))
        .ok_or_else(|| {
            tracing::debug!("{}: no TOC marker line", filing);
            ExtractError::TocNotFound(filing.to_string())
        })?;

    let mut candidates = Vec::new();
    let mut seen_items = HashSet::new();
    let mut end = None;

    for (idx, raw) in lines.iter().enumerate().skip(start + 1) {
        let line = raw.as_ref().trim();

        if TOC_TERMINATOR_RE.is_match(line) {
            end = Some(idx);
            break;
        }

        if let Some(caps) = ITEM_CANDIDATE_RE.captures(line) {
            if !seen_items.insert(normalize_item(&caps[1])) {
                tracing::debug!("{}: item repeats at line {}, closing TOC region", filing, idx);
                end = Some(idx);
                break;
            }
            candidates.push(line.to_string());
        } else if PART_HEADER_RE.is_match(line) {
            candidates.push(line.to_string());
        }
    }

    if candidates.is_empty() {
        tracing::debug!("{}: TOC marker at line {} but no entry lines followed", filing, start);
        return Err(ExtractError::TocNotFound(filing.to_string()));
    }

    tracing::debug!(
        "{}: TOC region lines {}..{:?}, {} candidate lines",
        filing,
        start,
        end,
        candidates.len()
    );
    Ok(TocRegion { start, end, lines: candidates })
}
