//! A small in-memory element tree.
//!
//! Holds the dashboard markup so it can be updated region by region and
//! serialized to HTML on demand. Only the operations the dashboard needs
//! are provided: lookup by `#id` or `.class`, text replacement, child
//! replacement, and inline style edits.

pub mod html;

use std::fmt;

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Trusted markup emitted verbatim (stylesheets).
    Raw(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
            Node::Text(text) => out.push_str(text),
            Node::Raw(_) => {}
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An element selector: `#id` or `.class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    Id(&'static str),
    Class(&'static str),
}

impl Selector {
    fn matches(&self, el: &Element) -> bool {
        match self {
            Selector::Id(id) => el.id.as_deref() == Some(*id),
            Selector::Class(class) => el.has_class(class),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "#{id}"),
            Selector::Class(class) => write!(f, ".{class}"),
        }
    }
}

/// An HTML element with ordered attributes and inline style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub style: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    // -- Builders --

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.set_style(property, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    // -- Queries --

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// Direct child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First element matching `selector`, depth first, including `self`.
    pub fn find(&self, selector: Selector) -> Option<&Element> {
        if selector.matches(self) {
            return Some(self);
        }
        self.child_elements()
            .find_map(|child| child.find(selector))
    }

    pub fn find_mut(&mut self, selector: Selector) -> Option<&mut Element> {
        if selector.matches(self) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(el) => el.find_mut(selector),
            _ => None,
        })
    }

    /// Number of elements matching `selector` in this subtree.
    pub fn count(&self, selector: Selector) -> usize {
        let own = usize::from(selector.matches(self));
        own + self
            .child_elements()
            .map(|child| child.count(selector))
            .sum::<usize>()
    }

    // -- Mutation --

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    pub fn replace_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    /// Set an inline style property, keeping declaration order stable.
    pub fn set_style(&mut self, property: &str, value: &str) {
        match self.style.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value.to_string(),
            None => self.style.push((property.to_string(), value.to_string())),
        }
    }
}

/// A full page: `<head>` content plus the `<body>` element tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub head: Vec<Node>,
    pub body: Element,
}

impl Document {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            head: Vec::new(),
            body: Element::new("body"),
        }
    }

    pub fn query(&self, selector: Selector) -> Option<&Element> {
        self.body.find(selector)
    }

    pub fn query_mut(&mut self, selector: Selector) -> Option<&mut Element> {
        self.body.find_mut(selector)
    }

    pub fn get_element_by_id(&self, id: &'static str) -> Option<&Element> {
        self.query(Selector::Id(id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
