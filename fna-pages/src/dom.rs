//! DOM helpers over `kuchikiki`.

use kuchikiki::NodeRef;
use kuchikiki::traits::{NodeIterator, TendrilSink};

use crate::markup::escape;

/// Parse a whole HTML document.
pub fn parse(html: &str) -> NodeRef {
    kuchikiki::parse_html().one(html)
}

/// All elements below `node` matching `selector`, in document order.
///
/// Selectors are compile-time constants here; an unparsable one matches
/// nothing.
pub fn select_all(node: &NodeRef, selector: &str) -> Vec<NodeRef> {
    node.select(selector)
        .map(|matches| matches.map(|m| m.as_node().clone()).collect())
        .unwrap_or_default()
}

/// First element below `node` matching `selector`.
pub fn select_first(node: &NodeRef, selector: &str) -> Option<NodeRef> {
    node.select_first(selector).ok().map(|m| m.as_node().clone())
}

/// The `<body>` of a parsed document (the parser always creates one).
pub fn body(document: &NodeRef) -> NodeRef {
    select_first(document, "body").unwrap_or_else(|| document.clone())
}

pub fn is_element(node: &NodeRef, name: &str) -> bool {
    node.as_element().is_some_and(|e| &*e.name.local == name)
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()?
        .attributes
        .borrow()
        .get(name)
        .map(str::to_owned)
}

/// Drop every attribute of an element.
pub fn clear_attributes(node: &NodeRef) {
    if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().map.clear();
    }
}

/// Concatenation of the trimmed, non-empty text nodes below `node`.
pub fn stripped_text(node: &NodeRef) -> String {
    node.descendants()
        .text_nodes()
        .filter_map(|text| {
            let text = text.borrow();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .collect()
}

/// Nearest enclosing `<p>`.
pub fn parent_paragraph(node: &NodeRef) -> Option<NodeRef> {
    node.ancestors().find(|n| is_element(n, "p"))
}

pub fn next_paragraph(node: &NodeRef) -> Option<NodeRef> {
    node.following_siblings().find(|n| is_element(n, "p"))
}

pub fn previous_paragraph(node: &NodeRef) -> Option<NodeRef> {
    node.preceding_siblings().find(|n| is_element(n, "p"))
}

/// Outer HTML of a node.
pub fn outer_html(node: &NodeRef) -> String {
    node.to_string()
}

/// Attributes of the `<html>` element, rendered as ` name="value"` pairs.
pub fn html_attributes(document: &NodeRef) -> String {
    let Ok(html) = document.select_first("html") else {
        return String::new();
    };
    let attributes = html.attributes.borrow();
    attributes
        .map
        .iter()
        .map(|(name, attribute)| format!(" {}=\"{}\"", &*name.local, escape(&attribute.value)))
        .collect()
}
