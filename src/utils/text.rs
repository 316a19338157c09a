//! Text canonicalization shared by signatures, keyword extraction and the
//! importer's instruction handling.

use scraper::{Html, Node};

/// Elements that start a new line in the visible text
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "br", "li", "ol", "ul", "div", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "section",
    "article", "blockquote", "pre",
];

/// Elements whose text content is never visible
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template", "head"];

/// Trim, lowercase and collapse whitespace runs to a single space.
///
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// [`normalize`] for absent values: `None` becomes the empty string
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// Collapse whitespace runs to single spaces without changing case
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup from an HTML fragment and keep only visible text.
///
/// Entities are decoded, block elements become line breaks, whitespace is
/// collapsed within each line and blank lines are dropped. Plain text passes
/// through with its line structure intact.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                });
                if !hidden {
                    out.push_str(text);
                }
            }
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => out.push('\n'),
            _ => {}
        }
    }

    out.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whitespace-delimited word count, used as a cheap token estimate
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
