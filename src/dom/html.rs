//! HTML serialization for [`Document`] trees.

use std::fmt::Write;

use super::{Document, Element, Node};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Serialize a full document, including the doctype.
pub fn render_document(doc: &Document) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_text(&doc.title));
    for node in &doc.head {
        write_node(&mut out, node);
        out.push('\n');
    }
    out.push_str("</head>\n");
    write_element(&mut out, &doc.body);
    out.push_str("\n</html>\n");
    out
}

/// Serialize a single element subtree.
pub fn render_element(el: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, el);
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(el) => write_element(out, el),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Raw(markup) => out.push_str(markup),
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);

    if let Some(id) = &el.id {
        let _ = write!(out, " id=\"{}\"", escape_attr(id));
    }
    if !el.classes.is_empty() {
        let _ = write!(out, " class=\"{}\"", escape_attr(&el.classes.join(" ")));
    }
    for (name, value) in &el.attrs {
        let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
    }
    if !el.style.is_empty() {
        let css: Vec<String> = el.style.iter().map(|(p, v)| format!("{p}: {v}")).collect();
        let _ = write!(out, " style=\"{}\"", escape_attr(&css.join("; ")));
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&el.tag.as_str()) {
        return;
    }

    for child in &el.children {
        write_node(out, child);
    }
    let _ = write!(out, "</{}>", el.tag);
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn renders_attributes_in_order() {
        let el = Element::new("img")
            .with_id("video-feed")
            .with_class("feed")
            .with_attr("src", "/video_feed")
            .with_style("display", "none");
        assert_eq!(
            render_element(&el),
            r#"<img id="video-feed" class="feed" src="/video_feed" style="display: none">"#
        );
    }

    #[test]
    fn renders_nested_children_and_escapes_text() {
        let el = Element::new("p")
            .with_class("no-tags")
            .with_text("<none>");
        assert_eq!(render_element(&el), r#"<p class="no-tags">&lt;none&gt;</p>"#);
    }

    #[test]
    fn raw_nodes_are_not_escaped() {
        let mut doc = Document::new("Tags & Poses");
        doc.head.push(Node::Raw("<style>a > b {}</style>".to_string()));
        let html = render_document(&doc);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Tags &amp; Poses</title>"));
        assert!(html.contains("<style>a > b {}</style>"));
        assert!(html.contains("<body></body>"));
    }
}
