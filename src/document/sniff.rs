// src/document/sniff.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

// Binary blobs show NUL bytes early; text filings never do.
const BINARY_PROBE_LEN: usize = 8 * 1024;

// Without an SGML envelope, only the head of the content is checked for tags.
const HEAD_PROBE_LEN: usize = 64 * 1024;

// Structural HTML tags. Legacy text filings carry SGML <TABLE>/<CAPTION>/<PAGE>
// markup, which must not make them count as HTML.
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:html|body|div|p|tr|td|br|font)[\s>/]")
        .expect("Failed to compile HTML_TAG_RE")
});

// End of the first document of a full-submission envelope. Exhibits follow it.
static DOCUMENT_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</DOCUMENT>").expect("Failed to compile DOCUMENT_END_RE"));

/// Coarse classification of a filing's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Html,
    Plaintext,
    Unknown,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Html => "html",
            DocumentFormat::Plaintext => "plaintext",
            DocumentFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a content buffer as HTML, plain text, or unknown.
///
/// Only the primary document decides: the first `<DOCUMENT>` of a
/// full-submission envelope, or the first 64 KiB of anything else, so HTML
/// exhibits appended to a text filing do not flip it to HTML.
///
/// Non-UTF-8 content is still checked for HTML tags (many older filings are
/// Latin-1 encoded); plain text without a valid UTF-8 decoding is `Unknown`.
pub fn sniff_format(content: &[u8]) -> DocumentFormat {
    if is_blank(content) || looks_binary(content) {
        return DocumentFormat::Unknown;
    }

    let text = String::from_utf8_lossy(content);
    if HTML_TAG_RE.is_match(primary_document(&text)) {
        return DocumentFormat::Html;
    }

    if std::str::from_utf8(content).is_ok() {
        DocumentFormat::Plaintext
    } else {
        DocumentFormat::Unknown
    }
}

fn primary_document(text: &str) -> &str {
    if let Some(end) = DOCUMENT_END_RE.find(text) {
        return &text[..end.start()];
    }
    let mut end = text.len().min(HEAD_PROBE_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

pub(crate) fn is_blank(content: &[u8]) -> bool {
    content.iter().all(u8::is_ascii_whitespace)
}

pub(crate) fn looks_binary(content: &[u8]) -> bool {
    content.iter().take(BINARY_PROBE_LEN).any(|&b| b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_html_documents() {
        let html = b"<html><body><p>Annual report</p></body></html>";
        assert_eq!(sniff_format(html), DocumentFormat::Html);
    }

    #[test]
    fn detects_html_wrapped_in_sgml_submission() {
        let content = b"<SEC-DOCUMENT>0000066740-20-000010.txt\n<DOCUMENT>\n<TYPE>10-K\n<TEXT>\n<div style=\"x\">Item 1.</div>";
        assert_eq!(sniff_format(content), DocumentFormat::Html);
    }

    #[test]
    fn legacy_sgml_tables_stay_plaintext() {
        let content = b"<DOCUMENT>\n<TABLE>\n<CAPTION>\n<S>     <C>\nTABLE OF CONTENTS\n<PAGE>\nItem 1. Business\n</TABLE>";
        assert_eq!(sniff_format(content), DocumentFormat::Plaintext);
    }

    #[test]
    fn html_exhibits_do_not_flip_a_text_submission() {
        let content = "<SEC-DOCUMENT>\n<DOCUMENT>\n<TYPE>10-K\n<TEXT>\nTABLE OF CONTENTS\nITEM 1. Business 4\n\
            </TEXT>\n</DOCUMENT>\n<DOCUMENT>\n<TYPE>EX-21\n<TEXT>\n<HTML><BODY><P>Subsidiaries</P></BODY></HTML>\n\
            </TEXT>\n</DOCUMENT>\n";
        assert_eq!(sniff_format(content.as_bytes()), DocumentFormat::Plaintext);
    }

    #[test]
    fn tags_past_the_head_are_ignored() {
        let mut content = "Annual report line\n".repeat(4096).into_bytes();
        content.extend_from_slice(b"<div>late markup</div>");
        assert!(content.len() > HEAD_PROBE_LEN);
        assert_eq!(sniff_format(&content), DocumentFormat::Plaintext);
    }

    #[test]
    fn latin1_text_is_unknown() {
        let content = [b'R', b'e', b's', b'u', b'm', 0xE9, b'\n'];
        assert_eq!(sniff_format(&content), DocumentFormat::Unknown);
    }

    #[test]
    fn latin1_html_is_still_html() {
        let mut content = b"<html><body>Soci".to_vec();
        content.push(0xE9);
        content.extend_from_slice(b"t</body></html>");
        assert_eq!(sniff_format(&content), DocumentFormat::Html);
    }

    #[test]
    fn blank_and_binary_are_unknown() {
        assert_eq!(sniff_format(b""), DocumentFormat::Unknown);
        assert_eq!(sniff_format(b"  \n\t"), DocumentFormat::Unknown);
        assert_eq!(sniff_format(b"PK\x03\x04\x00\x00"), DocumentFormat::Unknown);
    }
}
