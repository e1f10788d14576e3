//! HTML to readable text

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

/// Elements dropped with everything inside them
const SKIPPED: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "nav", "header",
    "footer", "aside", "form",
];

/// Elements that start a new line
const BLOCKS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

/// Nesting past this depth is ignored
const MAX_DEPTH: usize = 256;

static CONTENT_ROOTS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "main", "[role=\"main\"]", "body"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

/// Readable text of an HTML document.
///
/// The first of `article`, `main`, `[role=main]` and `body` that yields any
/// text is used. Returns an empty string when nothing readable is found.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector in CONTENT_ROOTS.iter() {
        if let Some(root) = document.select(selector).next() {
            let mut raw = String::new();
            collect_text(root, &mut raw, 0);
            let text = normalise_whitespace(&raw);
            if !text.is_empty() {
                return text;
            }
        }
    }

    String::new()
}

fn collect_text(element: ElementRef<'_>, out: &mut String, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCKS.contains(&name);
                if block {
                    out.push('\n');
                }
                collect_text(child_ref, out, depth + 1);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapse runs of spaces inside lines and drop blank lines
pub fn normalise_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let mut words = line.split_whitespace().peekable();
        if words.peek().is_none() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        for (i, word) in words.enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// Cut `text` to at most `max_chars` characters; 0 means no limit.
///
/// Returns whether anything was cut.
pub fn truncate_chars(text: String, max_chars: usize) -> (String, bool) {
    if max_chars == 0 {
        return (text, false);
    }
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut text = text;
            text.truncate(byte_idx);
            (text, true)
        }
        None => (text, false),
    }
}
