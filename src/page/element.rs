//! Minimal DOM element: a tag name and its attributes.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    attributes: BTreeMap<String, String>,
}

impl Element {
    /// Create an element. Tag names are reported upper-cased, as in HTML documents.
    pub fn new(tag: &str) -> Self {
        Self {
            tag_name: tag.to_ascii_uppercase(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Attribute names are case-insensitive.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }
}
