// src/toc/cleanup.rs
//! Ordered, named text cleanup rules.
//!
//! Each table is applied top to bottom in a single pass over the input. Rules
//! are named so that a log line or a test can point at the exact substitution
//! responsible for a change.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// One `(pattern, replacement)` substitution. `replacement` may use `$1`-style
/// capture references.
#[derive(Debug)]
pub struct CleanupRule {
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl CleanupRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        let pattern = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("Failed to compile cleanup rule '{}': {}", name, e));
        Self { name, pattern, replacement }
    }

    /// Applies this rule alone.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, self.replacement)
    }
}

/// Runs every rule of `rules` in order.
pub fn apply_rules(rules: &[CleanupRule], text: &str) -> String {
    let mut current = text.to_string();
    for rule in rules {
        if let Cow::Owned(changed) = rule.apply(&current) {
            tracing::trace!("Cleanup rule '{}' rewrote text", rule.name);
            current = changed;
        }
    }
    current
}

/// Finds a rule by name.
pub fn rule<'r>(rules: &'r [CleanupRule], name: &str) -> Option<&'r CleanupRule> {
    rules.iter().find(|r| r.name == name)
}

/// Rules for the free text of a caption-style TOC table. The output is meant
/// to be split on `\n`, one structural header per line.
pub static TOC_TEXT_RULES: Lazy<Vec<CleanupRule>> = Lazy::new(|| {
    vec![
        // Everything up to and including the banner ("... TABLE OF CONTENTS").
        CleanupRule::new("strip-banner", r"(?is)^.*?\btable\s+(?:of\s+)?contents\b[ \t]*", ""),
        // HTML tends to collapse rows into one run; put every header on its own line.
        CleanupRule::new("break-before-part", r"(?i)[ \t]*\b(PART[ \t]+[IVX]+\b)", "\n$1"),
        CleanupRule::new("break-before-item", r"(?i)[ \t]*\b(ITEM[ \t]*\d+[A-Z]?\b)", "\n$1"),
        CleanupRule::new("drop-dash-runs", r"-{2,}|[–—]{2,}", " "),
        CleanupRule::new("drop-dot-leaders", r"\.{3,}|(?:\.[ \t]){3,}", " "),
        CleanupRule::new("collapse-spaces", r"[ \t\u{a0}]+", " "),
    ]
});

/// Rules for the text of one DOM block before it enters the document body.
pub static BLOCK_TEXT_RULES: Lazy<Vec<CleanupRule>> = Lazy::new(|| {
    vec![
        CleanupRule::new("nbsp-to-space", r"[\u{a0}\u{2007}\u{202f}]", " "),
        CleanupRule::new("drop-zero-width", r"[\u{200b}\u{200c}\u{200d}\u{feff}]", ""),
        CleanupRule::new("collapse-whitespace", r"\s+", " "),
    ]
});

// Lines of cleaned TOC text that carry no structure: page columns, bare numbers.
static NOISE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:pages?(?:\s*no\.?)?|\d+(?:\s*-\s*\d+)?)$")
        .expect("Failed to compile NOISE_LINE_RE")
});

/// Applies [`TOC_TEXT_RULES`] and returns the non-empty, non-noise lines.
pub fn toc_lines_from_text(text: &str) -> Vec<String> {
    apply_rules(&TOC_TEXT_RULES, text)
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !NOISE_LINE_RE.is_match(line))
        .map(str::to_string)
        .collect()
}
