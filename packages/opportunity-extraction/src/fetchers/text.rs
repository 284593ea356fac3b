//! HTML to plain text.
//!
//! Non-content elements are dropped, block elements become line breaks, and
//! the result goes through [`normalize_whitespace`].

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text never reaches the extractor.
const STRIPPED: &[&str] = &[
    "script", "style", "nav", "noscript", "template", "svg", "iframe",
];

/// Elements that start a new line in the text output.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// Cleaned text and `<title>` of an HTML document.
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let mut raw = String::with_capacity(html.len() / 2);
    collect_text(document.root_element(), &mut raw);

    (title, normalize_whitespace(&raw))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if STRIPPED.contains(&name) {
                    continue;
                }
                let block = BLOCK.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Normalize page text.
///
/// Lines are trimmed and split on runs of two or more spaces; each chunk
/// has its whitespace collapsed; empty chunks are dropped; chunks are joined
/// with `\n`. Applying it twice gives the same result as applying it once.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(|chunk| chunk.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut `text` to at most `max_chars` characters.
///
/// Returns the text unchanged when it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_non_content_elements() {
        let html = r#"
            <html>
              <head><title>Volunteer | SoupMobile</title><style>body { color: red; }</style></head>
              <body>
                <nav><a href="/">Home</a><a href="/donate">Donate</a></nav>
                <script>var tracking = true;</script>
                <noscript>Enable JavaScript</noscript>
                <h1>Serve with us</h1>
                <p>Meals are served   every   Monday.</p>
                <svg><text>icon</text></svg>
                <iframe src="https://maps.example"></iframe>
              </body>
            </html>
        "#;

        let (title, text) = html_to_text(html);

        assert_eq!(title.as_deref(), Some("Volunteer | SoupMobile"));
        assert!(text.contains("Serve with us"));
        assert!(text.contains("Meals are served\nevery\nMonday."));
        for hidden in ["Home", "Donate", "tracking", "color: red", "Enable JavaScript", "icon"] {
            assert!(!text.contains(hidden), "{hidden} leaked into text");
        }
    }

    #[test]
    fn test_block_elements_separate_lines() {
        let (_, text) = html_to_text(
            "<table><tr><td>Mon</td><td>9am</td></tr></table><ul><li>Sort</li><li>Pack</li></ul>",
        );
        assert_eq!(text, "Mon\n9am\nSort\nPack");
    }

    #[test]
    fn test_inline_elements_stay_on_line() {
        let (_, text) = html_to_text("<p>Call <b>Jane</b> at <a href='tel:1'>555-0100</a></p>");
        assert_eq!(text, "Call Jane at 555-0100");
    }

    #[test]
    fn test_empty_document() {
        let (title, text) = html_to_text("<html><body><script>x()</script></body></html>");
        assert!(title.is_none());
        assert!(text.is_empty());
    }

    #[test]
    fn test_normalize_whitespace() {
        let raw = "  Volunteer  Opportunities \n\n\n\tFood\t bank   shifts \r\n  ";
        assert_eq!(normalize_whitespace(raw), "Volunteer\nOpportunities\nFood bank\nshifts");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("", 0), "");
    }

    proptest! {
        #[test]
        fn normalize_whitespace_is_idempotent(s in "[ a-zA-Z\\t\\n\\r\u{a0}é.]{0,120}") {
            let once = normalize_whitespace(&s);
            prop_assert_eq!(normalize_whitespace(&once), once);
        }

        #[test]
        fn normalized_lines_are_clean(s in "\\PC{0,200}") {
            let once = normalize_whitespace(&s);
            for line in once.lines() {
                prop_assert!(!line.is_empty());
                prop_assert_eq!(line.trim(), line);
                prop_assert!(!line.contains("  "));
            }
        }
    }
}
