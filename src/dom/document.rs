//! The injected view of a document and its window

use super::node::{Element, NodeId};
use serde::{Deserialize, Serialize};

/// One entry of an event's composed path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathEntry {
    Node(NodeId),
    /// The document object itself
    Document,
    /// The window object
    Window,
}

/// Where a text selection's common ancestor lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "node")]
pub enum SelectionAnchor {
    /// The common ancestor is an element
    Element(NodeId),
    /// The common ancestor is a text node; the id is its parent element
    Text(NodeId),
}

/// Live text selection in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelection {
    pub text: String,
    pub anchor: SelectionAnchor,
}

impl TextSelection {
    /// Element owning the selection, walking up from a text node when needed
    pub fn anchor_element(&self) -> NodeId {
        match self.anchor {
            SelectionAnchor::Element(id) | SelectionAnchor::Text(id) => id,
        }
    }
}

/// Read access to a document plus the few window-level mutations the
/// recorder performs.
pub trait Document {
    fn element(&self, id: NodeId) -> Option<&Element>;

    /// The `<html>` element
    fn root(&self) -> NodeId;

    /// The `<body>` element
    fn body(&self) -> NodeId;

    /// Current location
    fn url(&self) -> String;

    /// Inner window size `(width, height)`
    fn window_size(&self) -> (u32, u32);

    fn user_agent(&self) -> String;

    fn platform(&self) -> String;

    /// Element holding keyboard focus
    fn active_element(&self) -> Option<NodeId>;

    fn selection(&self) -> Option<TextSelection>;

    fn clear_selection(&mut self);

    /// Toggle a class on the body, used as the selection-mode affordance
    fn set_body_class(&mut self, class: &str, enabled: bool);

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.element(id)?.parent
    }

    /// Ancestors of `id`, nearest first, excluding `id`
    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// `id` followed by all of its descendants in document order
    fn descendants_and_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(el) = self.element(node) {
                out.push(node);
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }

    /// Target-to-window path as reported by `Event.composedPath()`
    fn composed_path(&self, target: NodeId) -> Vec<PathEntry> {
        let mut path = vec![PathEntry::Node(target)];
        path.extend(self.ancestors(target).into_iter().map(PathEntry::Node));
        path.push(PathEntry::Document);
        path.push(PathEntry::Window);
        path
    }

    /// Nearest element, starting at `id` itself, that satisfies `predicate`
    fn closest(&self, id: NodeId, predicate: &dyn Fn(&Element) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|node| self.element(*node).is_some_and(predicate))
    }

    /// Whether the focused element is a text field
    fn focus_in_text_field(&self) -> bool {
        self.active_element()
            .and_then(|id| self.element(id))
            .is_some_and(Element::is_text_field)
    }
}
