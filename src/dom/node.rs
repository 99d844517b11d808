//! Element nodes of the document model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of an element inside its document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Tags that accept free text and are treated as text fields
const TEXT_FIELD_TAGS: [&str; 2] = ["input", "textarea"];

/// Tags whose `play` events are captured
const MEDIA_TAGS: [&str; 2] = ["video", "audio"];

/// A single element.
///
/// Only the parts of an element the recorder and controller look at are
/// modelled: identity attributes, direct text, form value and tree links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    /// `id` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Class list in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Remaining attributes (`data-testid`, `placeholder`, `role`, `name`, `src`, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Direct text content
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Current value of a form control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

impl Element {
    /// Create a bare element; the tag is lowercased
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add classes from a space-separated list
    pub fn with_class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Attribute lookup; `id` and `class` are answered from their dedicated fields
    pub fn attr(&self, name: &str) -> Option<&str> {
        match name {
            "id" => self.id.as_deref(),
            _ => self.attributes.get(name).map(String::as_str),
        }
    }

    /// Non-empty `id`
    pub fn element_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Non-empty `data-testid`
    pub fn test_id(&self) -> Option<&str> {
        self.attr("data-testid").filter(|v| !v.is_empty())
    }

    /// Non-empty `placeholder`
    pub fn placeholder(&self) -> Option<&str> {
        self.attr("placeholder").filter(|v| !v.is_empty())
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }

    pub fn is_text_field(&self) -> bool {
        TEXT_FIELD_TAGS.contains(&self.tag.as_str())
    }

    pub fn is_form(&self) -> bool {
        self.tag == "form"
    }

    pub fn is_media(&self) -> bool {
        MEDIA_TAGS.contains(&self.tag.as_str())
    }

    /// Form value, or empty when the element carries none
    pub fn current_value(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_lowercases_tag_and_splits_classes() {
        let el = Element::new("BUTTON").with_class("btn  primary").with_id("go");
        assert_eq!(el.tag, "button");
        assert_eq!(el.classes, vec!["btn", "primary"]);
        assert_eq!(el.attr("id"), Some("go"));
    }

    #[test]
    fn test_empty_identity_attributes_are_ignored() {
        let el = Element::new("div").with_id("").with_attr("data-testid", "");
        assert!(el.element_id().is_none());
        assert!(el.test_id().is_none());
    }

    #[test]
    fn test_element_categories() {
        assert!(Element::new("textarea").is_text_field());
        assert!(Element::new("input").is_text_field());
        assert!(!Element::new("select").is_text_field());
        assert!(Element::new("audio").is_media());
        assert!(Element::new("form").is_form());
    }
}
