// src/toc/parse.rs
use crate::toc::cleanup::toc_lines_from_text;
use crate::toc::model::TocEntry;
use crate::toc::patterns::{
    clean_title, element_text, normalize_item, normalize_part, roman_value, split_trailing_page,
    ITEM_LINE_RE, ITEM_MARKER_RE, ITEM_ONLY_RE, PART_HEADER_RE,
};
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));

static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("Failed to compile CELL_SELECTOR"));

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("Failed to compile LINK_SELECTOR"));

static CAPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("caption").expect("Failed to compile CAPTION_SELECTOR"));

/// Carries the current part across lines. Never moves back to an earlier part.
#[derive(Debug, Default)]
struct PartTracker {
    label: Option<String>,
    rank: u32,
}

impl PartTracker {
    fn observe(&mut self, numeral: &str, filing: &str) {
        let Some(rank) = roman_value(numeral) else {
            return;
        };
        if rank < self.rank {
            tracing::debug!(
                "{}: ignoring PART {} after {:?}",
                filing,
                numeral.to_uppercase(),
                self.label
            );
            return;
        }
        self.rank = rank;
        self.label = Some(normalize_part(numeral));
    }

    fn current(&self) -> Option<String> {
        self.label.clone()
    }
}

/// Classifies TOC lines into entries.
///
/// Part headers update the part context and are not emitted. Item lines become
/// item entries. Any other line becomes an index entry once a part is known,
/// and is dropped before that.
pub fn parse_toc_lines<S: AsRef<str>>(lines: &[S], filing: &str) -> Vec<TocEntry> {
    let mut parts = PartTracker::default();
    let mut entries = Vec::new();

    for raw in lines {
        let mut line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = PART_HEADER_RE.captures(line) {
            parts.observe(&caps[1], filing);
            // "PART I  Item 1. Business 4" on one line: keep the item half.
            let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
            if !ITEM_LINE_RE.is_match(rest) {
                continue;
            }
            line = rest;
        }

        if let Some(caps) = ITEM_LINE_RE.captures(line) {
            let title = clean_title(&caps[2]);
            if title.is_empty() {
                tracing::debug!(
                    "{}",
                    ExtractError::EmptyEntryTitle { filing: filing.to_string(), line: line.to_string() }
                );
                continue;
            }
            tracing::trace!("{}: item line '{}'", filing, line);
            entries.push(TocEntry::item(
                parts.current(),
                normalize_item(&caps[1]),
                title,
                caps.get(3).map(|m| m.as_str().to_string()),
            ));
            continue;
        }

        if parts.current().is_some() && !ITEM_MARKER_RE.is_match(line) {
            let (title, page) = split_trailing_page(line);
            if title.is_empty() {
                tracing::debug!(
                    "{}",
                    ExtractError::EmptyEntryTitle { filing: filing.to_string(), line: line.to_string() }
                );
                continue;
            }
            tracing::trace!("{}: index line '{}'", filing, line);
            entries.push(TocEntry::index(parts.current(), title, page));
            continue;
        }

        tracing::trace!("{}: discarded TOC line '{}'", filing, line);
    }

    entries
}

/// Caption/free-text mode: reads the table as text, one row per line, runs the
/// TOC cleanup rules (banner removal, one header per line) and classifies the
/// resulting lines.
pub fn parse_table_text(table: ElementRef<'_>, filing: &str) -> Vec<TocEntry> {
    let text = table_text(table);
    let lines = toc_lines_from_text(&text);
    tracing::debug!("{}: {} cleaned TOC lines from table text", filing, lines.len());
    parse_toc_lines(&lines, filing)
}

/// Text of a table with cells joined by spaces and rows by newlines.
pub fn table_text(table: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    if let Some(caption) = table.select(&CAPTION_SELECTOR).next() {
        lines.push(element_text(caption));
    }
    for row in table.select(&ROW_SELECTOR) {
        let cells: Vec<String> = row
            .select(&CELL_SELECTOR)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();
        if !cells.is_empty() {
            lines.push(cells.join(" "));
        }
    }
    if lines.is_empty() {
        lines.push(element_text(table));
    }
    lines.join("\n")
}

/// Row mode: one entry per row of a linked TOC table.
///
/// The title comes from the first non-empty cell (its link text when it holds
/// a link, whose href is kept as the entry anchor) and the page from the last
/// cell. A title cell holding only "Item 1." takes its title from the next
/// non-empty cell instead.
pub fn parse_table_rows(table: ElementRef<'_>, filing: &str) -> Vec<TocEntry> {
    let mut parts = PartTracker::default();
    let mut entries = Vec::new();

    for (row_idx, row) in table.select(&ROW_SELECTOR).enumerate() {
        let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
        let texts: Vec<String> = cells.iter().map(|cell| element_text(*cell)).collect();

        let Some(title_idx) = texts.iter().position(|text| !text.is_empty()) else {
            continue; // spacer row
        };

        // Part rows often span the whole table in a single cell.
        if let Some(caps) = PART_HEADER_RE.captures(&texts[title_idx]) {
            parts.observe(&caps[1], filing);
            continue;
        }

        if cells.len() < 2 {
            tracing::debug!(
                "{}",
                ExtractError::MalformedTocRow {
                    filing: filing.to_string(),
                    row: row_idx,
                    reason: format!("{} cell(s), expected at least 2", cells.len()),
                }
            );
            continue;
        }

        let last_idx = cells.len() - 1;
        if texts[last_idx].eq_ignore_ascii_case("page") || texts[last_idx].eq_ignore_ascii_case("pages") {
            tracing::trace!("{}: skipping header row {}", filing, row_idx);
            continue;
        }

        let (mut title, mut anchor) = link_or_text(cells[title_idx]);
        let mut title_cell = title_idx;
        let mut item = None;

        if let Some(caps) = ITEM_ONLY_RE.captures(&title) {
            item = Some(normalize_item(&caps[1]));
            let next = (title_idx + 1..cells.len()).find(|idx| !texts[*idx].is_empty() && *idx != last_idx);
            match next {
                Some(idx) => {
                    let (next_title, next_anchor) = link_or_text(cells[idx]);
                    title = next_title;
                    anchor = anchor.or(next_anchor);
                    title_cell = idx;
                }
                None => title.clear(),
            }
        } else if let Some(caps) = ITEM_LINE_RE.captures(&title) {
            item = Some(normalize_item(&caps[1]));
            title = caps[2].to_string();
        }

        let title = clean_title(&title);
        if title.is_empty() {
            tracing::debug!(
                "{}",
                ExtractError::EmptyEntryTitle { filing: filing.to_string(), line: texts.join(" | ") }
            );
            continue;
        }

        let page = if title_cell == last_idx || texts[last_idx].is_empty() {
            None
        } else {
            Some(texts[last_idx].clone())
        };

        entries.push(TocEntry {
            part: parts.current(),
            item,
            title,
            page,
            anchor,
        });
    }

    entries
}

// Link text and href when the cell holds a link, the cell text otherwise.
fn link_or_text(cell: ElementRef<'_>) -> (String, Option<String>) {
    match cell.select(&LINK_SELECTOR).next() {
        Some(link) => {
            let href = link.value().attr("href").map(str::to_string);
            let text = element_text(link);
            if text.is_empty() {
                (element_text(cell), href)
            } else {
                (text, href)
            }
        }
        None => (element_text(cell), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first_table(html: &Html) -> ElementRef<'_> {
        let selector = Selector::parse("table").unwrap();
        html.select(&selector).next().unwrap()
    }

    fn item(part: Option<&str>, item: &str, title: &str, page: Option<&str>) -> TocEntry {
        TocEntry::item(
            part.map(str::to_string),
            item.to_string(),
            title.to_string(),
            page.map(str::to_string),
        )
    }

    #[test]
    fn item_lines_without_parts() {
        let entries = parse_toc_lines(&["ITEM 1. Business 4", "ITEM 1A. Risk Factors 9"], "A");
        assert_eq!(
            entries,
            vec![
                item(None, "ITEM 1", "Business", Some("4")),
                item(None, "ITEM 1A", "Risk Factors", Some("9")),
            ]
        );
    }

    #[test]
    fn part_context_and_index_entries() {
        let entries = parse_toc_lines(
            &["PART I", "Index to Financial Statements", "ITEM 1. Business 4"],
            "D",
        );
        assert_eq!(
            entries,
            vec![
                TocEntry::index(Some("PART I".to_string()), "Index to Financial Statements".to_string(), None),
                item(Some("PART I"), "ITEM 1", "Business", Some("4")),
            ]
        );
    }

    #[test]
    fn lines_before_any_part_are_dropped() {
        let entries = parse_toc_lines(&["Forward-looking statements", "Part ii", "Item 5. Market 20"], "X");
        assert_eq!(entries, vec![item(Some("PART II"), "ITEM 5", "Market", Some("20"))]);
    }

    #[test]
    fn parts_never_rewind() {
        let entries = parse_toc_lines(
            &["PART II", "Item 5. Market", "PART I", "Item 6. Reserved"],
            "X",
        );
        assert!(entries.iter().all(|e| e.part.as_deref() == Some("PART II")));
    }

    #[test]
    fn part_and_item_on_one_line() {
        let entries = parse_toc_lines(&["PART I ITEM 1. Business 4"], "X");
        assert_eq!(entries, vec![item(Some("PART I"), "ITEM 1", "Business", Some("4"))]);
    }

    #[test]
    fn item_markers_without_titles_are_dropped() {
        let entries = parse_toc_lines(&["PART I", "Item 1.", "Item 2 ."], "X");
        assert!(entries.is_empty());
    }

    #[test]
    fn rows_with_linked_titles() {
        let html = Html::parse_document(
            "<table><caption>Table of Contents</caption>\
             <tr><td><a href='#business'>Business</a></td><td>4</td></tr>\
             <tr><td><a href='#risk'>Risk Factors</a></td><td>9</td></tr>\
             <tr><td>orphan</td></tr></table>",
        );
        let entries = parse_table_rows(first_table(&html), "B");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Business");
        assert_eq!(entries[0].page.as_deref(), Some("4"));
        assert_eq!(entries[0].anchor.as_deref(), Some("#business"));
        assert_eq!(entries[1].title, "Risk Factors");
        assert_eq!(entries[1].page.as_deref(), Some("9"));
    }

    #[test]
    fn rows_with_separate_item_cells() {
        let html = Html::parse_document(
            "<table><tr><td colspan='3'>PART I</td></tr>\
             <tr><td></td><td></td><td>Page</td></tr>\
             <tr><td>Item 1.</td><td><a href='#i1'>Business</a></td><td>4</td></tr>\
             <tr><td>Item 1A.</td><td>Risk Factors</td><td>9</td></tr></table>",
        );
        let entries = parse_table_rows(first_table(&html), "B");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].part.as_deref(), Some("PART I"));
        assert_eq!(entries[0].item.as_deref(), Some("ITEM 1"));
        assert_eq!(entries[0].title, "Business");
        assert_eq!(entries[0].anchor.as_deref(), Some("#i1"));
        assert_eq!(entries[1].item.as_deref(), Some("ITEM 1A"));
        assert_eq!(entries[1].title, "Risk Factors");
        assert_eq!(entries[1].page.as_deref(), Some("9"));
    }

    #[test]
    fn caption_table_text_is_split_on_items() {
        let html = Html::parse_document(
            "<table><tr><td>TABLE OF CONTENTS PART I ITEM 1. Business 4 ITEM 1A. Risk Factors 9 \
             PART II ITEM 5. Market 20</td></tr></table>",
        );
        let entries = parse_table_text(first_table(&html), "C");
        assert_eq!(
            entries,
            vec![
                item(Some("PART I"), "ITEM 1", "Business", Some("4")),
                item(Some("PART I"), "ITEM 1A", "Risk Factors", Some("9")),
                item(Some("PART II"), "ITEM 5", "Market", Some("20")),
            ]
        );
    }

    #[test]
    fn table_rows_never_rewind_parts() {
        let html = Html::parse_document(
            "<table><tr><td colspan='3'>PART II</td></tr>\
             <tr><td>Item 5.</td><td>Market</td><td>20</td></tr>\
             <tr><td colspan='3'>PART I</td></tr>\
             <tr><td>Item 6.</td><td>Reserved</td><td>21</td></tr></table>",
        );
        let entries = parse_table_rows(first_table(&html), "R");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.part.as_deref() == Some("PART II")));
    }

    #[test]
    fn caption_text_never_rewinds_parts() {
        let html = Html::parse_document(
            "<table><tr><td>TABLE OF CONTENTS PART II ITEM 5. Market 20 PART I ITEM 6. Reserved 21</td></tr></table>",
        );
        let entries = parse_table_text(first_table(&html), "C");
        assert_eq!(
            entries,
            vec![
                item(Some("PART II"), "ITEM 5", "Market", Some("20")),
                item(Some("PART II"), "ITEM 6", "Reserved", Some("21")),
            ]
        );
    }

    #[test]
    fn table_text_joins_cells_per_row() {
        let html = Html::parse_document(
            "<table><caption>Table of Contents</caption>\
             <tr><td>Item 1.</td><td>Business</td><td>4</td></tr></table>",
        );
        assert_eq!(table_text(first_table(&html)), "Table of Contents\nItem 1. Business 4");
    }
}
