//! Products-container replacement and pretty-printed re-serialization of
//! category pages.
//!
//! The container's children are owned by the generator: whatever is inside
//! `div.products-grid` is discarded on every run.

use scraper::{ElementRef, Html, Node, Selector};

use crate::utils::html_escape;

pub const CONTAINER_SELECTOR: &str = "div.products-grid";

const INDENT: &str = "  ";
const STAMP_PREFIX: &str = "Last updated:";
const STAMP_SUFFIX: &str = "by automation";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Written exactly as parsed, never re-indented. Includes the raw-text
/// elements whose content must not be escaped again.
const VERBATIM_ELEMENTS: &[&str] = &[
    "pre", "textarea", "script", "style", "noscript", "iframe", "noembed", "noframes", "xmp",
];

struct Replacement<'a> {
    container: ElementRef<'a>,
    cards: Vec<Html>,
    stamp: String,
}

/// Stamp comment body, e.g. ` Last updated: 2025-01-31 09:15:00 by automation `
pub fn stamp_comment(timestamp: &str) -> String {
    format!(" {} {} {} ", STAMP_PREFIX, timestamp, STAMP_SUFFIX)
}

fn is_stamp(node: &Node) -> bool {
    match node {
        Node::Comment(comment) => {
            let text = comment.trim();
            text.starts_with(STAMP_PREFIX) && text.ends_with(STAMP_SUFFIX)
        }
        _ => false,
    }
}

fn is_blank(node: &Node) -> bool {
    match node {
        Node::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Replace the children of the products container with `cards` (raw HTML
/// fragments, in order) and put a timestamp comment right before it.
/// A stamp left by a previous run in that spot is replaced, not stacked.
///
/// Returns `None` if the page has no products container.
pub fn replace_products(source: &str, cards: &[String], timestamp: &str) -> Option<String> {
    let document = Html::parse_document(source);
    let selector = Selector::parse(CONTAINER_SELECTOR).ok()?;
    let container = document.select(&selector).next()?;

    let replacement = Replacement {
        container,
        cards: cards.iter().map(|c| Html::parse_fragment(c)).collect(),
        stamp: stamp_comment(timestamp),
    };

    let mut printer = Printer::default();
    printer.document(&document, &replacement);
    Some(printer.out)
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn line(&mut self, depth: usize, content: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(content);
        self.out.push('\n');
    }

    fn document(&mut self, document: &Html, replacement: &Replacement<'_>) {
        for child in document.tree.root().children() {
            self.node(child.value(), ElementRef::wrap(child), 0, Some(replacement));
        }
    }

    fn node<'a>(
        &mut self,
        value: &Node,
        element: Option<ElementRef<'a>>,
        depth: usize,
        replacement: Option<&Replacement<'a>>,
    ) {
        match value {
            Node::Doctype(doctype) => self.line(depth, &format!("<!DOCTYPE {}>", doctype.name())),
            Node::Comment(comment) => {
                let body: &str = comment;
                self.line(depth, &format!("<!--{}-->", body));
            }
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    self.line(depth, &escape_text(text));
                }
            }
            Node::Element(_) => {
                if let Some(el) = element {
                    self.element(el, depth, replacement);
                }
            }
            _ => {}
        }
    }

    fn element<'a>(&mut self, el: ElementRef<'a>, depth: usize, replacement: Option<&Replacement<'a>>) {
        let name = el.value().name();

        let target = replacement.filter(|r| r.container.id() == el.id());
        if let Some(r) = target {
            self.line(depth, &format!("<!--{}-->", r.stamp));
        }

        if VERBATIM_ELEMENTS.contains(&name) {
            self.line(depth, &el.html());
            return;
        }

        self.line(depth, &start_tag(el));
        if VOID_ELEMENTS.contains(&name) {
            return;
        }

        if let Some(r) = target {
            for card in &r.cards {
                for child in card.root_element().children() {
                    self.node(child.value(), ElementRef::wrap(child), depth + 1, None);
                }
            }
        } else {
            self.children(el, depth + 1, replacement);
        }

        self.line(depth, &format!("</{}>", name));
    }

    fn children<'a>(&mut self, parent: ElementRef<'a>, depth: usize, replacement: Option<&Replacement<'a>>) {
        for child in parent.children() {
            if let Some(r) = replacement {
                if is_stamp(child.value()) {
                    let next = child
                        .next_siblings()
                        .find(|n| !is_blank(n.value()))
                        .and_then(ElementRef::wrap);
                    if next.map(|n| n.id()) == Some(r.container.id()) {
                        continue;
                    }
                }
            }
            self.node(child.value(), ElementRef::wrap(child), depth, replacement);
        }
    }
}

fn start_tag(el: ElementRef<'_>) -> String {
    let mut tag = format!("<{}", el.value().name());
    for (name, value) in el.value().attrs() {
        tag.push(' ');
        tag.push_str(name);
        tag.push_str("=\"");
        tag.push_str(&escape_attr(value));
        tag.push('"');
    }
    tag.push('>');
    tag
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    html_escape(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Chairs</title><style>.a > .b { color: red; }</style></head>
<body>
<section class="products">
<h2>Top Chairs</h2>
<div class="products-grid"><div class="product-card">hand written</div></div>
</section>
<script>if (a < b) { go(); }</script>
</body>
</html>"#;

    fn card_names(html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let sel = Selector::parse("div.products-grid > div.product-card h3").unwrap();
        doc.select(&sel)
            .map(|h| h.text().collect::<String>().trim().to_string())
            .collect()
    }

    #[test]
    fn test_replaces_container_children() {
        let cards = vec![
            r#"<div class="product-card"><h3>First</h3></div>"#.to_string(),
            r#"<div class="product-card"><h3>Second</h3></div>"#.to_string(),
        ];
        let out = replace_products(PAGE, &cards, "2025-01-31 09:15:00").unwrap();

        assert_eq!(card_names(&out), vec!["First", "Second"]);
        assert!(!out.contains("hand written"));
        assert!(out.starts_with("<!DOCTYPE html>\n"));
        assert!(out.contains("<h2>"));
    }

    #[test]
    fn test_stamp_precedes_container() {
        let out = replace_products(PAGE, &[], "2025-01-31 09:15:00").unwrap();
        let stamp = out
            .find("<!-- Last updated: 2025-01-31 09:15:00 by automation -->")
            .unwrap();
        let grid = out.find(r#"<div class="products-grid">"#).unwrap();
        assert!(stamp < grid);
        assert!(out[stamp..grid].lines().count() <= 2);
    }

    #[test]
    fn test_rerun_replaces_previous_stamp() {
        let first = replace_products(PAGE, &[], "2025-01-31 09:15:00").unwrap();
        let second = replace_products(&first, &[], "2025-02-01 10:00:00").unwrap();
        assert!(!second.contains("2025-01-31 09:15:00"));
        assert_eq!(second.matches("Last updated:").count(), 1);
    }

    #[test]
    fn test_verbatim_elements_untouched() {
        let out = replace_products(PAGE, &[], "2025-01-31 09:15:00").unwrap();
        assert!(out.contains("if (a < b) { go(); }"));
        assert!(out.contains(".a > .b { color: red; }"));
    }

    #[test]
    fn test_noscript_markup_survives() {
        let tracker = r#"<noscript><iframe src="https://gtm.example/ns" height="0"></iframe></noscript>"#;
        let page = format!(
            r#"<html><body>{}<div class="products-grid"></div></body></html>"#,
            tracker
        );
        let out = replace_products(&page, &[], "2025-01-31 09:15:00").unwrap();
        assert!(out.contains(tracker));
        assert!(!out.contains("&lt;iframe"));

        let again = replace_products(&out, &[], "2025-02-01 10:00:00").unwrap();
        assert_eq!(again.matches("<iframe").count(), 1);
        assert!(!again.contains("&lt;iframe"));
    }

    #[test]
    fn test_missing_container() {
        let page = "<html><body><div class=\"products\"></div></body></html>";
        assert!(replace_products(page, &[], "2025-01-31 09:15:00").is_none());
    }

    #[test]
    fn test_pretty_print_indents_and_escapes() {
        let page = r#"<html><body><p title="a &quot;b&quot;">x &amp; y</p><br><div class="products-grid"></div></body></html>"#;
        let out = replace_products(page, &[], "t").unwrap();
        assert!(out.contains("\n    <p title=\"a &quot;b&quot;\">\n      x &amp; y\n    </p>\n"));
        assert!(out.contains("\n    <br>\n"));
        assert!(!out.contains("</br>"));
    }
}
