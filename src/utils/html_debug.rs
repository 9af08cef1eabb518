// src/utils/html_debug.rs
use crate::toc::TocResult;
use crate::utils::error::StorageError;
use regex::Regex;
use std::fs;
use std::path::Path;

/// What a highlighted span of the filing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    TocMarker,
    PartHeader,
    ItemHeader,
    SectionTitle,
}

impl HighlightKind {
    fn css_class(&self) -> &'static str {
        match self {
            HighlightKind::TocMarker => "highlight-toc",
            HighlightKind::PartHeader => "highlight-part",
            HighlightKind::ItemHeader => "highlight-item",
            HighlightKind::SectionTitle => "highlight-section",
        }
    }
}

/// Renders `html` with every highlight wrapped in a colored span.
/// Overlapping highlights keep the earliest one.
pub fn render_highlights(html: &str, highlights: &[(usize, usize, HighlightKind)]) -> String {
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");

    // CSS for highlight colors
    debug_html.push_str(".highlight-toc { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-part { background-color: #FFA500; }\n");
    debug_html.push_str(".highlight-item { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-section { background-color: #ADD8E6; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| (h.0, h.1));

    let mut last_pos = 0;
    for (start, end, kind) in sorted_highlights {
        if start < last_pos || end > html.len() || start >= end {
            continue;
        }
        debug_html.push_str(&html[last_pos..start]);
        debug_html.push_str(&format!(
            "<span class=\"{}\" title=\"Position: {}-{}, Type: {:?}\">",
            kind.css_class(),
            start,
            end,
            kind
        ));
        debug_html.push_str(&html[start..end]);
        debug_html.push_str("</span>");
        last_pos = end;
    }

    if last_pos < html.len() {
        debug_html.push_str(&html[last_pos..]);
    }
    debug_html.push_str("\n</body>\n</html>");
    debug_html
}

/// Finds TOC markers, part and item headers, and the TOC titles in the raw
/// filing, so a reader can see where the engine saw structure.
pub fn collect_highlights(html: &str, toc: Option<&TocResult>) -> Vec<(usize, usize, HighlightKind)> {
    let mut patterns: Vec<(String, HighlightKind)> = vec![
        (r"(?i)\btable\s+(?:of\s+)?contents\b".to_string(), HighlightKind::TocMarker),
        (r"(?i)\bpart\s+[ivx]+\b".to_string(), HighlightKind::PartHeader),
        (r"(?i)\bitem\s*\d+[a-z]?\b\.?".to_string(), HighlightKind::ItemHeader),
    ];
    if let Some(toc) = toc {
        for title in toc.titles() {
            patterns.push((format!("(?i){}", regex::escape(title)), HighlightKind::SectionTitle));
        }
    }

    let mut highlights = Vec::new();
    for (pattern, kind) in &patterns {
        match Regex::new(pattern) {
            Ok(re) => highlights.extend(re.find_iter(html).map(|m| (m.start(), m.end(), *kind))),
            Err(e) => tracing::warn!("Skipping debug highlight pattern '{}': {}", pattern, e),
        }
    }
    highlights
}

/// Writes an annotated copy of an HTML filing.
pub fn save_annotated_html(html: &str, toc: Option<&TocResult>, path: &Path) -> Result<(), StorageError> {
    let highlights = collect_highlights(html, toc);
    fs::write(path, render_highlights(html, &highlights))?;
    tracing::info!("Saved debug HTML to {} ({} highlights)", path.display(), highlights.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::{TocEntry, TocOrigin};

    #[test]
    fn highlights_wrap_matches() {
        let out = render_highlights("abc ITEM 1. def", &[(4, 11, HighlightKind::ItemHeader)]);
        assert!(out.contains("abc <span class=\"highlight-item\""));
        assert!(out.contains(">ITEM 1.</span> def"));
    }

    #[test]
    fn overlapping_highlights_keep_the_first() {
        let html = "Table of Contents";
        let out = render_highlights(
            html,
            &[(0, 17, HighlightKind::TocMarker), (9, 17, HighlightKind::SectionTitle)],
        );
        assert_eq!(out.matches("<span").count(), 1);
        assert!(out.contains(">Table of Contents</span>"));
    }

    #[test]
    fn toc_titles_are_highlighted_literally() {
        let toc = TocResult {
            filing: "X".to_string(),
            origin: TocOrigin::Table,
            entries: vec![TocEntry::index(None, "Risk (Factors)".to_string(), None)],
        };
        let highlights = collect_highlights("<p>risk (factors)</p>", Some(&toc));
        assert!(highlights.iter().any(|h| h.2 == HighlightKind::SectionTitle && h.0 == 3));
    }
}
