// src/toc/patterns.rs
//! Regexes and small text helpers shared by the TOC locator and parser.

use crate::toc::cleanup::{apply_rules, BLOCK_TEXT_RULES};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, ElementRef};

fn compile(name: &str, pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("Failed to compile {}: {}", name, e))
}

/// "TABLE OF CONTENTS" or "TABLE CONTENTS", any case.
pub static TOC_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| compile("TOC_MARKER_RE", r"(?i)\btable\s+(?:of\s+)?contents\b"));

/// Trailing matter that ends a line-scanned TOC region.
pub static TOC_TERMINATOR_RE: Lazy<Regex> =
    Lazy::new(|| compile("TOC_TERMINATOR_RE", r"(?i)\bsignatures\b|\bexhibits\b"));

/// A line-scan candidate: "Item 1.", "ITEM 1A." at the start of the line.
pub static ITEM_CANDIDATE_RE: Lazy<Regex> =
    Lazy::new(|| compile("ITEM_CANDIDATE_RE", r"(?i)^\s*item\s*(\d+[a-z]?)\."));

/// "PART I", "Part IV - Other Information"; group 1 is the numeral, group 2 the rest.
pub static PART_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    compile("PART_HEADER_RE", r"(?i)^\s*part\s*([ivx]+)\b[\s.:\-–—]*(.*)$")
});

/// "<ITEM n> <separator> <title> <page>"; groups: number, title, page.
pub static ITEM_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    compile(
        "ITEM_LINE_RE",
        r"(?i)^\s*item\s*(\d+[a-z]?)\b\.?\s*[-–—:.]*\s*(.+?)(?:[\s.]+((?:[a-z]-)?\d+))?\s*$",
    )
});

/// A cell holding nothing but the item marker, e.g. "Item 1A."
pub static ITEM_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| compile("ITEM_ONLY_RE", r"(?i)^\s*item\s*(\d+[a-z]?)\b\.?\s*$"));

/// An item marker anywhere in the line.
pub static ITEM_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| compile("ITEM_MARKER_RE", r"(?i)\bitem\s*\d+"));

// Index-style line with an optional trailing page token.
static TRAILING_PAGE_RE: Lazy<Regex> = Lazy::new(|| {
    compile("TRAILING_PAGE_RE", r"(?i)^(.+?)(?:[\s.]+((?:[a-z]-)?\d+))?\s*$")
});

static TRAILING_DOT_LEADER_RE: Lazy<Regex> =
    Lazy::new(|| compile("TRAILING_DOT_LEADER_RE", r"[\s.]*\.{2,}[\s.]*$"));

/// "1a" -> "ITEM 1A"
pub fn normalize_item(number: &str) -> String {
    format!("ITEM {}", number.trim().to_uppercase())
}

/// "ii" -> "PART II"
pub fn normalize_part(numeral: &str) -> String {
    format!("PART {}", numeral.trim().to_uppercase())
}

/// Value of a Roman numeral made of I, V and X. `None` for anything else.
pub fn roman_value(numeral: &str) -> Option<u32> {
    let digits: Option<Vec<u32>> = numeral
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            _ => None,
        })
        .collect();
    let digits = digits?;
    if digits.is_empty() {
        return None;
    }

    let mut total = 0;
    for (idx, value) in digits.iter().enumerate() {
        match digits.get(idx + 1) {
            Some(next) if next > value => total -= *value as i64,
            _ => total += *value as i64,
        }
    }
    u32::try_from(total).ok().filter(|v| *v > 0)
}

/// Trims dashes, separators and whitespace from a heading, plus any trailing dot leader.
pub fn clean_title(raw: &str) -> String {
    let without_leader = TRAILING_DOT_LEADER_RE.replace(raw, "");
    without_leader
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '.'))
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—'))
        .to_string()
}

/// Splits "Index to Financial Statements 45" into title and page.
pub fn split_trailing_page(line: &str) -> (String, Option<String>) {
    match TRAILING_PAGE_RE.captures(line) {
        Some(caps) => (
            clean_title(caps.get(1).map_or("", |m| m.as_str())),
            caps.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (clean_title(line), None),
    }
}

// Elements whose text never runs into a neighbour's: "CONTENTS</td><td>Item" reads as two words.
const SEPARATING_TAGS: &[&str] = &[
    "br", "caption", "dd", "div", "dt", "h1", "h2", "h3", "h4", "h5", "h6", "li", "p", "table",
    "td", "th", "tr",
];

/// Whitespace-normalized text content of an element. Cell and line-level
/// children are kept apart by a space; inline markup is not.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(&text.text),
            Node::Element(child) if SEPARATING_TAGS.contains(&child.name()) => raw.push(' '),
            _ => {}
        }
    }
    apply_rules(&BLOCK_TEXT_RULES, &raw).trim().to_string()
}
