//! Selector strategies for events captured in the host document
//!
//! These are tuned for toolbar and chrome elements, which are mostly tabs and
//! buttons with short labels, and differ from the frame-side rules in
//! [`crate::capture::selector`].

use crate::capture::selector::visible_classes;
use crate::dom::{Document, Element, NodeId};

/// Roles treated as tab or button-like
const CLICKABLE_ROLES: &[&str] = &["tab", "button", "menuitem", "link"];

/// Tags treated as tab or button-like
const CLICKABLE_TAGS: &[&str] = &["button", "a"];

/// Ancestors searched for a labelled clickable, beyond the target itself
const CLICKABLE_SEARCH_DEPTH: usize = 3;

/// Longer labels are not used as `text=` selectors
const MAX_LABEL_LEN: usize = 50;

/// Substrings that mark a class as naming an input
const INPUT_CLASS_KEYWORDS: &[&str] = &[
    "input", "field", "search", "textarea", "editor", "text", "query", "prompt",
];

fn is_clickable(el: &Element) -> bool {
    el.role().is_some_and(|role| CLICKABLE_ROLES.contains(&role))
        || CLICKABLE_TAGS.contains(&el.tag.as_str())
}

/// Whitespace-collapsed text of `id` and its descendants
pub fn text_content<D: Document + ?Sized>(doc: &D, id: NodeId) -> String {
    doc.descendants_and_self(id)
        .into_iter()
        .filter_map(|node| doc.element(node))
        .flat_map(|el| el.text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `target` sits inside an element carrying `toolbar_class`
pub fn in_toolbar<D: Document + ?Sized>(doc: &D, target: NodeId, toolbar_class: &str) -> bool {
    doc.closest(target, &|el: &Element| el.classes.iter().any(|c| c == toolbar_class))
        .is_some()
}

/// Selector for a click in the host document
pub fn host_click_selector<D: Document + ?Sized>(doc: &D, target: NodeId) -> String {
    let candidates = std::iter::once(target)
        .chain(doc.ancestors(target))
        .take(CLICKABLE_SEARCH_DEPTH + 1);
    for node in candidates {
        let Some(el) = doc.element(node) else { break };
        if !is_clickable(el) {
            continue;
        }
        let label = text_content(doc, node);
        if !label.is_empty() && label.chars().count() <= MAX_LABEL_LEN {
            return format!("text={}", label);
        }
    }

    let Some(el) = doc.element(target) else {
        return String::new();
    };
    if let Some(test_id) = el.test_id() {
        return format!("[data-testid=\"{}\"]", test_id);
    }
    if let Some(element_id) = el.element_id() {
        return format!("#{}", element_id);
    }
    tag_and_classes(el, &visible_classes(el))
}

/// Selector for an input typed into the host document
pub fn host_input_selector<D: Document + ?Sized>(doc: &D, target: NodeId) -> String {
    let Some(el) = doc.element(target) else {
        return String::new();
    };
    if let Some(test_id) = el.test_id() {
        return format!("[data-testid=\"{}\"]", test_id);
    }
    if let Some(element_id) = el.element_id() {
        return format!("#{}", element_id);
    }
    if let Some(placeholder) = el.placeholder() {
        return format!("[placeholder=\"{}\"]", placeholder);
    }

    let classes = visible_classes(el);
    let meaningful = classes.iter().find(|class| {
        let lower = class.to_lowercase();
        INPUT_CLASS_KEYWORDS.iter().any(|kw| lower.contains(kw))
    });
    if let Some(class) = meaningful {
        return format!("{}.{}", el.tag, class);
    }

    tag_and_classes(el, &classes)
}

fn tag_and_classes(el: &Element, classes: &[&str]) -> String {
    if classes.is_empty() {
        el.tag.clone()
    } else {
        format!("{}.{}", el.tag, classes.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;

    #[test]
    fn test_tab_label_becomes_text_selector() {
        let mut doc = DomTree::default();
        let tab = doc.append(
            DomTree::BODY,
            Element::new("div").with_attr("role", "tab").with_id("tab-2"),
        );
        let label = doc.append(tab, Element::new("span").with_text("  Bounties  "));

        assert_eq!(host_click_selector(&doc, label), "text=Bounties");
    }

    #[test]
    fn test_long_label_falls_back_to_attributes() {
        let mut doc = DomTree::default();
        let button = doc.append(
            DomTree::BODY,
            Element::new("button")
                .with_attr("data-testid", "publish")
                .with_text(&"x".repeat(51)),
        );
        assert_eq!(host_click_selector(&doc, button), "[data-testid=\"publish\"]");
    }

    #[test]
    fn test_clickable_beyond_depth_is_not_used() {
        let mut doc = DomTree::default();
        let mut node = doc.append(DomTree::BODY, Element::new("button").with_text("Go"));
        for _ in 0..4 {
            node = doc.append(node, Element::new("span"));
        }
        assert_eq!(host_click_selector(&doc, node), "span");
    }

    #[test]
    fn test_plain_div_click_uses_classes() {
        let mut doc = DomTree::default();
        let div = doc.append(DomTree::BODY, Element::new("div").with_class("panel dark"));
        assert_eq!(host_click_selector(&doc, div), "div.panel.dark");
    }

    #[test]
    fn test_toolbar_detection() {
        let mut doc = DomTree::default();
        let bar = doc.append(DomTree::BODY, Element::new("div").with_class("staktrak-toolbar"));
        let button = doc.append(bar, Element::new("button").with_text("Stop"));
        let outside = doc.append(DomTree::BODY, Element::new("button"));

        assert!(in_toolbar(&doc, button, "staktrak-toolbar"));
        assert!(!in_toolbar(&doc, outside, "staktrak-toolbar"));
    }

    #[test]
    fn test_input_selector_priority() {
        let mut doc = DomTree::default();
        let by_placeholder = doc.append(
            DomTree::BODY,
            Element::new("input")
                .with_class("w-full")
                .with_attr("placeholder", "Search bounties"),
        );
        let by_class = doc.append(
            DomTree::BODY,
            Element::new("textarea").with_class("rounded ChatPrompt border"),
        );
        let by_all_classes = doc.append(DomTree::BODY, Element::new("input").with_class("a b"));
        let bare = doc.append(DomTree::BODY, Element::new("input"));

        assert_eq!(
            host_input_selector(&doc, by_placeholder),
            "[placeholder=\"Search bounties\"]"
        );
        assert_eq!(host_input_selector(&doc, by_class), "textarea.ChatPrompt");
        assert_eq!(host_input_selector(&doc, by_all_classes), "input.a.b");
        assert_eq!(host_input_selector(&doc, bare), "input");
    }

    #[test]
    fn test_text_content_collapses_whitespace() {
        let mut doc = DomTree::default();
        let a = doc.append(DomTree::BODY, Element::new("a").with_text(" Open\n"));
        doc.append(a, Element::new("b").with_text("  tab "));
        assert_eq!(text_content(&doc, a), "Open tab");
    }
}
