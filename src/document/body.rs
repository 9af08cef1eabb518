// src/document/body.rs
use crate::toc::cleanup::{apply_rules, BLOCK_TEXT_RULES};
use scraper::{node::Node, Html};

// Elements whose boundaries start a new block of body text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "center", "dd", "div",
    "dl", "dt", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "tfoot", "thead", "title", "tr",
    "ul",
];

// Table cells stay on their row's line, separated by a space.
const CELL_TAGS: &[&str] = &["td", "th"];

// Never part of the readable body.
const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "noscript", "template"];

// Inline HTML. Text directly under any element outside these lists (SGML
// wrappers such as <DOCUMENT>, <TEXT>, <PAGE>, <S>, <C>) keeps its line breaks.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "big", "cite", "code", "del", "dfn", "em", "font", "html", "i", "ins",
    "kbd", "label", "mark", "nobr", "q", "small", "span", "strong", "sub", "sup", "tt", "u",
];

/// The walkable body of a filing: an ordered list of text blocks.
///
/// For HTML each block is the normalized text of one block-level element run
/// (headings, paragraphs, divs, table rows...) in document order. Inside
/// `<pre>` and non-HTML elements every line of a text node is its own block.
/// For plain text each block is one raw line, so [`Body::text`] gives back the
/// input unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    blocks: Vec<String>,
}

impl Body {
    pub fn from_text(text: &str) -> Self {
        Self {
            blocks: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn from_html(document: &Html) -> Self {
        let mut collector = BlockCollector::default();
        let mut stack = vec![Visit::Enter(document.tree.root())];
        let mut preformatted = 0usize;

        while let Some(visit) = stack.pop() {
            let node = match visit {
                Visit::Leave { block, pre } => {
                    if pre {
                        preformatted -= 1;
                    }
                    if block {
                        collector.flush();
                    }
                    continue;
                }
                Visit::Enter(node) => node,
            };

            match node.value() {
                Node::Text(text) => {
                    let line_sensitive = preformatted > 0
                        || node
                            .parent()
                            .and_then(|parent| parent.value().as_element())
                            .map_or(false, |parent| !is_html_tag(parent.name()));
                    if line_sensitive {
                        collector.push_lines(&text.text);
                    } else {
                        collector.push_text(&text.text);
                    }
                }
                Node::Element(element) => {
                    let name = element.name();
                    if SKIPPED_TAGS.contains(&name) {
                        continue;
                    }
                    let block = BLOCK_TAGS.contains(&name);
                    if block {
                        collector.flush();
                    } else if CELL_TAGS.contains(&name) {
                        collector.separate();
                    }
                    let pre = name == "pre";
                    if pre {
                        preformatted += 1;
                    }
                    stack.push(Visit::Leave { block, pre });
                    let children: Vec<_> = node.children().collect();
                    stack.extend(children.into_iter().rev().map(Visit::Enter));
                }
                Node::Document | Node::Fragment => {
                    let children: Vec<_> = node.children().collect();
                    stack.extend(children.into_iter().rev().map(Visit::Enter));
                }
                _ => {} // Comments, doctype, processing instructions
            }
        }
        collector.flush();

        tracing::trace!("Collected {} body blocks from DOM", collector.blocks.len());
        Self { blocks: collector.blocks }
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks joined with `\n`.
    pub fn text(&self) -> String {
        self.blocks.join("\n")
    }
}

fn is_html_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name) || CELL_TAGS.contains(&name) || INLINE_TAGS.contains(&name)
}

enum Visit<N> {
    Enter(N),
    Leave { block: bool, pre: bool },
}

#[derive(Default)]
struct BlockCollector {
    blocks: Vec<String>,
    current: String,
}

impl BlockCollector {
    fn push_text(&mut self, text: &str) {
        self.current.push_str(text);
    }

    // Each line break ends the current block.
    fn push_lines(&mut self, text: &str) {
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                self.flush();
            }
            self.push_text(line);
        }
    }

    fn separate(&mut self) {
        if !self.current.is_empty() && !self.current.ends_with(' ') {
            self.current.push(' ');
        }
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let cleaned = apply_rules(&BLOCK_TEXT_RULES, &self.current);
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            self.blocks.push(trimmed.to_string());
        }
        self.current.clear();
    }
}
