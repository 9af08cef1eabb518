// src/extractors/section.rs

// --- Imports ---
use crate::document::Body;
use crate::toc::TocResult;
use serde::ser::{Serialize, SerializeMap, Serializer};

// --- Bucket Names ---
pub const FULL_DOCUMENT_SECTION: &str = "Full Document";
pub const INTRODUCTION_SECTION: &str = "Introduction"; // text before the first matched title
pub const UNASSIGNED_SECTION: &str = "Unassigned";     // a TOC existed but no title ever matched

// --- Data Structures ---

/// Section title -> section text, in order of first appearance.
///
/// Keys are unique: a title that is already present gets a " (2)", " (3)"...
/// suffix, so repeated TOC titles never merge or overwrite each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    sections: Vec<(String, String)>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section and returns the key it was stored under.
    pub fn insert(&mut self, title: &str, text: String) -> String {
        let key = self.unique_key(title);
        self.sections.push((key.clone(), text));
        key
    }

    fn unique_key(&self, title: &str) -> String {
        if !self.contains_key(title) {
            return title.to_string();
        }
        (2..)
            .map(|n| format!("{} ({})", title, n))
            .find(|candidate| !self.contains_key(candidate))
            .unwrap_or_else(|| title.to_string())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.sections.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, text)| text.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section texts joined with `\n` in map order; equals the walked body text.
    pub fn joined_text(&self) -> String {
        self.sections
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (key, text) in &self.sections {
            map.serialize_entry(key, text)?;
        }
        map.end()
    }
}

// --- Segmenter ---

/// Partitions the body into sections keyed by TOC titles.
///
/// Blocks are walked in order with a cursor over the TOC entries. A block
/// opens a new section when the title of an entry at or after the cursor
/// occurs in it (case-insensitive substring); the cursor then moves past that
/// entry, so each entry opens at most one section and later mentions of it
/// are ignored. The opening block belongs to the section it opens. The first
/// mention wins even when it is not the real heading (a TOC row, a
/// cross-reference).
///
/// Without entries the whole body becomes one "Full Document" section.
pub fn segment_sections(body: &Body, toc: Option<&TocResult>) -> SectionMap {
    let entries = match toc {
        Some(toc) if !toc.is_empty() => &toc.entries,
        _ => {
            tracing::debug!("No TOC entries, returning body as '{}'", FULL_DOCUMENT_SECTION);
            let mut map = SectionMap::new();
            map.insert(FULL_DOCUMENT_SECTION, body.text());
            return map;
        }
    };

    let needles: Vec<String> = entries.iter().map(|e| match_key(&e.title)).collect();
    let mut sections = SectionMap::new();
    let mut current_section: Option<&str> = None;
    let mut buffer: Vec<&str> = Vec::new();
    let mut cursor = 0;
    let mut matched_count = 0;

    for block in body.blocks() {
        if cursor < needles.len() {
            let haystack = match_key(block);
            let hit = needles[cursor..]
                .iter()
                .position(|needle| !needle.is_empty() && haystack.contains(needle.as_str()));

            if let Some(offset) = hit {
                let matched = cursor + offset;
                close_section(&mut sections, current_section, &mut buffer);
                current_section = Some(entries[matched].title.as_str());
                cursor = matched + 1;
                matched_count += 1;
                tracing::trace!("Section '{}' opens at block '{}'", entries[matched].title, block);
            }
        }
        buffer.push(block);
    }

    match current_section {
        Some(_) => close_section(&mut sections, current_section, &mut buffer),
        None => {
            tracing::debug!("No TOC title matched the body, returning '{}'", UNASSIGNED_SECTION);
            sections.insert(UNASSIGNED_SECTION, buffer.join("\n"));
        }
    }

    tracing::debug!(
        "Segmented {} blocks into {} sections ({} of {} TOC entries matched)",
        body.blocks().len(),
        sections.len(),
        matched_count,
        entries.len()
    );
    sections
}

// Stores the buffered blocks under the open section; text before any section goes to the introduction.
fn close_section(sections: &mut SectionMap, current: Option<&str>, buffer: &mut Vec<&str>) {
    match current {
        Some(title) => {
            sections.insert(title, buffer.join("\n"));
        }
        None if !buffer.is_empty() => {
            sections.insert(INTRODUCTION_SECTION, buffer.join("\n"));
        }
        None => {}
    }
    buffer.clear();
}

// Lowercased with whitespace runs collapsed, for substring matching.
fn match_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::{TocEntry, TocOrigin};

    fn toc(titles: &[&str]) -> TocResult {
        TocResult {
            filing: "TEST".to_string(),
            origin: TocOrigin::LineScan,
            entries: titles
                .iter()
                .map(|t| TocEntry::index(Some("PART I".to_string()), t.to_string(), None))
                .collect(),
        }
    }

    #[test]
    fn no_toc_returns_full_document() {
        let text = "Annual report\nNo contents here.\n";
        let body = Body::from_text(text);
        let sections = segment_sections(&body, None);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections.get(FULL_DOCUMENT_SECTION), Some(text));
    }

    #[test]
    fn empty_toc_is_treated_as_missing() {
        let body = Body::from_text("a\nb");
        let mut empty = toc(&[]);
        empty.entries.clear();
        let sections = segment_sections(&body, Some(&empty));
        assert_eq!(sections.keys().collect::<Vec<_>>(), vec![FULL_DOCUMENT_SECTION]);
    }

    #[test]
    fn sections_open_at_matching_blocks() {
        let body = Body::from_text(
            "Cover page\nITEM 1. BUSINESS\nWe make widgets.\nITEM 1A. RISK FACTORS\nWidgets may fail.",
        );
        let sections = segment_sections(&body, Some(&toc(&["Business", "Risk Factors"])));
        assert_eq!(
            sections.keys().collect::<Vec<_>>(),
            vec![INTRODUCTION_SECTION, "Business", "Risk Factors"]
        );
        assert_eq!(sections.get(INTRODUCTION_SECTION), Some("Cover page"));
        assert_eq!(sections.get("Business"), Some("ITEM 1. BUSINESS\nWe make widgets."));
        assert_eq!(sections.get("Risk Factors"), Some("ITEM 1A. RISK FACTORS\nWidgets may fail."));
    }

    #[test]
    fn cursor_only_moves_forward() {
        // "Business" is mentioned again inside Risk Factors; it must not reopen.
        let body = Body::from_text("Business\nintro\nRisk Factors\nour business may suffer\nProperties\nleased");
        let sections = segment_sections(&body, Some(&toc(&["Business", "Risk Factors", "Properties"])));
        assert_eq!(sections.len(), 3);
        assert_eq!(
            sections.get("Risk Factors"),
            Some("Risk Factors\nour business may suffer")
        );
    }

    #[test]
    fn skipped_entries_are_not_revisited() {
        // "Properties" matches before "Risk Factors" appears, so Risk Factors is passed over.
        let body = Body::from_text("Business\nProperties\nRisk Factors\nmore");
        let sections = segment_sections(&body, Some(&toc(&["Business", "Risk Factors", "Properties"])));
        assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["Business", "Properties"]);
        assert_eq!(sections.get("Properties"), Some("Properties\nRisk Factors\nmore"));
    }

    #[test]
    fn first_mention_wins_even_in_the_toc() {
        let body = Body::from_text("TABLE OF CONTENTS\nItem 1. Business 4\nItem 2. Properties 9\nItem 1. Business\ntext");
        let sections = segment_sections(&body, Some(&toc(&["Business", "Properties"])));
        assert_eq!(sections.get("Business"), Some("Item 1. Business 4"));
        assert_eq!(
            sections.get("Properties"),
            Some("Item 2. Properties 9\nItem 1. Business\ntext")
        );
    }

    #[test]
    fn unmatched_toc_goes_to_unassigned() {
        let body = Body::from_text("nothing\nrelevant");
        let sections = segment_sections(&body, Some(&toc(&["Business"])));
        assert_eq!(sections.keys().collect::<Vec<_>>(), vec![UNASSIGNED_SECTION]);
        assert_eq!(sections.get(UNASSIGNED_SECTION), Some("nothing\nrelevant"));
    }

    #[test]
    fn repeated_titles_get_unique_keys() {
        let body = Body::from_text("Index\nfirst\nIndex\nsecond");
        let sections = segment_sections(&body, Some(&toc(&["Index", "Index"])));
        assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["Index", "Index (2)"]);
    }

    #[test]
    fn matching_ignores_case_and_spacing() {
        let body = Body::from_text("intro\nITEM 7.  MANAGEMENT'S   DISCUSSION and analysis\nbody");
        let sections = segment_sections(&body, Some(&toc(&["Management's Discussion and Analysis"])));
        assert!(sections.contains_key("Management's Discussion and Analysis"));
    }

    #[test]
    fn sections_reconstruct_the_body() {
        let text = "preamble\n\nTable of Contents\nBusiness 4\nRisk Factors 9\n\nBusiness\nWidgets.\n\nRisk Factors\nRisks.\n";
        let body = Body::from_text(text);
        for titles in [&["Business", "Risk Factors"][..], &["Nope"][..], &["Risk Factors"][..]] {
            let sections = segment_sections(&body, Some(&toc(titles)));
            assert_eq!(sections.joined_text(), text, "titles {:?}", titles);
        }
        assert_eq!(segment_sections(&body, None).joined_text(), text);
    }

    #[test]
    fn section_map_serializes_in_order() {
        let mut map = SectionMap::new();
        map.insert("Zeta", "z".to_string());
        map.insert("Alpha", "a".to_string());
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"Zeta":"z","Alpha":"a"}"#);
    }
}
