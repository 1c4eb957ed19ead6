//! Document abstraction the engine mutates.
//!
//! The engine never touches a concrete DOM. Every binder is written against
//! [`Dom`], which the browser crate implements over `web-sys` and
//! [`MemoryDom`] implements in memory for tests and native hosts.

use std::fmt;

pub mod memory;

pub use memory::{BrowsingEvent, MemoryDom, NodeId};

/// Mutable view of a page document.
///
/// Queries return nodes in document order. Mutations are visible to the
/// next read immediately.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Descendants of `scope` (or of the whole document) matching `query`.
    fn query(&self, scope: Option<&Self::Node>, query: &Query) -> Vec<Self::Node>;

    /// Lowercase tag name
    fn tag_name(&self, node: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// All attributes in source order
    fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Current form value. Selects report their selected option.
    fn value(&self, node: &Self::Node) -> String;

    fn set_value(&mut self, node: &Self::Node, value: &str);

    fn text(&self, node: &Self::Node) -> String;

    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Creates a detached element
    fn create_element(&mut self, tag: &str) -> Self::Node;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Inserts `node` as the next sibling of `reference`
    fn insert_after(&mut self, reference: &Self::Node, node: &Self::Node);

    /// Detaches `node` (and its subtree) from the document
    fn remove(&mut self, node: &Self::Node);

    fn remove_children(&mut self, node: &Self::Node);

    /// Deep, detached copy of `node`
    fn clone_subtree(&mut self, node: &Self::Node) -> Self::Node;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn set_hidden(&mut self, node: &Self::Node, hidden: bool);

    fn is_hidden(&self, node: &Self::Node) -> bool;

    fn submit_form(&mut self, form: &Self::Node);

    fn navigate(&mut self, url: &str);

    fn open_window(&mut self, url: &str, target: &str);

    fn id(&self, node: &Self::Node) -> Option<String> {
        self.attribute(node, "id")
    }

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn add_class(&mut self, node: &Self::Node, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let classes = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &classes);
    }

    fn set_disabled(&mut self, node: &Self::Node, disabled: bool) {
        if disabled {
            self.set_attribute(node, "disabled", "");
        } else {
            self.remove_attribute(node, "disabled");
        }
    }

    fn is_disabled(&self, node: &Self::Node) -> bool {
        self.has_attribute(node, "disabled")
    }

    /// `node` followed by its ancestors, nearest first
    fn ancestors_inclusive(&self, node: &Self::Node) -> Vec<Self::Node> {
        let mut chain = vec![node.clone()];
        let mut current = self.parent(node);
        while let Some(parent) = current {
            current = self.parent(&parent);
            chain.push(parent);
        }
        chain
    }
}

/// Attribute requirement of a [`Query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatch {
    pub name: String,
    pub value: Option<String>,
}

/// Minimal typed selector: tag, classes and attributes, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub tag: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeMatch>,
}

impl Query {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn class(class: &str) -> Self {
        Self::any().with_class(class)
    }

    pub fn attr(name: &str) -> Self {
        Self::any().with_attr(name)
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str) -> Self {
        self.attributes.push(AttributeMatch {
            name: name.to_string(),
            value: None,
        });
        self
    }

    pub fn with_attr_value(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(AttributeMatch {
            name: name.to_string(),
            value: Some(value.to_string()),
        });
        self
    }

    /// Matches an element given its tag and an attribute reader
    pub fn matches<'a>(&self, tag: &str, attr: impl Fn(&str) -> Option<&'a str>) -> bool {
        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = attr("class").unwrap_or("");
            let present: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }
        self.attributes.iter().all(|m| match (attr(&m.name), &m.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
        })
    }

    /// CSS selector for `querySelectorAll`
    pub fn to_css(&self) -> String {
        let mut css = self.tag.clone().unwrap_or_default();
        for class in &self.classes {
            css.push('.');
            css.push_str(class);
        }
        for m in &self.attributes {
            match &m.value {
                Some(v) => css.push_str(&format!("[{}=\"{}\"]", m.name, v.replace('\\', "\\\\").replace('"', "\\\""))),
                None => css.push_str(&format!("[{}]", m.name)),
            }
        }
        if css.is_empty() {
            css.push('*');
        }
        css
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_to_css() {
        let q = Query::tag("select").with_attr_value("data-field-id", "package-type");
        assert_eq!(q.to_css(), "select[data-field-id=\"package-type\"]");
        assert_eq!(Query::class("formset-form").to_css(), ".formset-form");
        assert_eq!(Query::any().to_css(), "*");
        assert_eq!(
            Query::any().with_attr_value("title", r#"C:\dir "x""#).to_css(),
            r#"[title="C:\\dir \"x\""]"#
        );
    }

    #[test]
    fn test_query_matches_classes_and_attributes() {
        let q = Query::tag("a").with_class("btn").with_attr("data-confirm");
        let attrs = [("class", "btn btn-danger"), ("data-confirm", "Sure?")];
        let lookup = |name: &str| attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);
        assert!(q.matches("A", lookup));
        assert!(!q.matches("button", lookup));

        let missing = Query::attr("data-method");
        assert!(!missing.matches("a", lookup));
    }
}
