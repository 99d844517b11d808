//! In-memory arena document

use super::document::{Document, SelectionAnchor, TextSelection};
use super::node::{Element, NodeId};
use serde::{Deserialize, Serialize};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) staktrak/0.1";

/// Arena-backed document with an `<html><body>` skeleton.
///
/// Serializable so that replay sessions can ship a document snapshot next to
/// their event script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomTree {
    nodes: Vec<Element>,
    url: String,
    #[serde(default = "default_window_size")]
    window_size: (u32, u32),
    #[serde(default = "default_user_agent")]
    user_agent: String,
    #[serde(default)]
    platform: String,
    #[serde(default)]
    active: Option<NodeId>,
    #[serde(default)]
    selection: Option<TextSelection>,
}

fn default_window_size() -> (u32, u32) {
    (1280, 720)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl DomTree {
    /// Root element id (`<html>`)
    pub const ROOT: NodeId = NodeId(0);
    /// Body element id
    pub const BODY: NodeId = NodeId(1);

    /// Create an empty document at `url`
    pub fn new(url: &str) -> Self {
        let mut html = Element::new("html");
        html.children.push(Self::BODY);
        let mut body = Element::new("body");
        body.parent = Some(Self::ROOT);

        Self {
            nodes: vec![html, body],
            url: url.to_string(),
            window_size: default_window_size(),
            user_agent: default_user_agent(),
            platform: "Linux x86_64".to_string(),
            active: None,
            selection: None,
        }
    }

    /// Append `element` as the last child of `parent` and return its id.
    ///
    /// An unknown parent falls back to the body.
    pub fn append(&mut self, parent: NodeId, mut element: Element) -> NodeId {
        let parent = if parent.0 < self.nodes.len() {
            parent
        } else {
            Self::BODY
        };
        let id = NodeId(self.nodes.len());
        element.parent = Some(parent);
        element.children.clear();
        self.nodes.push(element);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(id.0)
    }

    /// Set a form control's value; the caller dispatches the `input` event
    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.value = Some(value.to_string());
        }
    }

    pub fn focus(&mut self, id: Option<NodeId>) {
        self.active = id;
    }

    /// Select `text` inside the element `id`, as if its text node were highlighted
    pub fn select_text(&mut self, id: NodeId, text: &str) {
        self.selection = Some(TextSelection {
            text: text.to_string(),
            anchor: SelectionAnchor::Text(id),
        });
    }

    /// Select across several children of `id`
    pub fn select_range(&mut self, id: NodeId, text: &str) {
        self.selection = Some(TextSelection {
            text: text.to_string(),
            anchor: SelectionAnchor::Element(id),
        });
    }

    pub fn navigate(&mut self, url: &str) {
        self.url = url.to_string();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    pub fn set_user_agent(&mut self, user_agent: &str) {
        self.user_agent = user_agent.to_string();
    }

    pub fn has_body_class(&self, class: &str) -> bool {
        self.nodes[Self::BODY.0].classes.iter().any(|c| c == class)
    }

    /// Check the arena links of a deserialized document
    pub fn validate(&self) -> crate::Result<()> {
        if self.nodes.len() < 2 {
            return Err(crate::Error::Session(
                "document needs at least <html> and <body>".to_string(),
            ));
        }
        for (index, el) in self.nodes.iter().enumerate() {
            let dangling = el
                .parent
                .into_iter()
                .chain(el.children.iter().copied())
                .find(|id| id.0 >= self.nodes.len());
            if let Some(id) = dangling {
                return Err(crate::Error::Session(format!(
                    "node {} links to missing node {}",
                    index, id.0
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Document for DomTree {
    fn element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    fn root(&self) -> NodeId {
        Self::ROOT
    }

    fn body(&self) -> NodeId {
        Self::BODY
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn platform(&self) -> String {
        self.platform.clone()
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    fn selection(&self) -> Option<TextSelection> {
        self.selection.clone().filter(|s| !s.text.trim().is_empty())
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn set_body_class(&mut self, class: &str, enabled: bool) {
        let body = &mut self.nodes[Self::BODY.0];
        body.classes.retain(|c| c != class);
        if enabled {
            body.classes.push(class.to_string());
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
