//! Selector inference for elements inside the recorded document

use crate::dom::{Document, Element, NodeId, PathEntry};

/// Classes with this prefix are added by the recorder itself and never appear in selectors
pub const MARKER_CLASS_PREFIX: &str = "staktrak-";

/// Maximum number of ancestors visited by the fallback path walk
const MAX_ANCESTOR_LEVELS: usize = 3;

/// Entries at the end of a composed path that are not elements (document, window)
const PATH_SENTINELS: usize = 2;

/// Class list without recorder-internal markers
pub fn visible_classes(el: &Element) -> Vec<&str> {
    el.classes
        .iter()
        .map(String::as_str)
        .filter(|c| !c.is_empty() && !c.starts_with(MARKER_CLASS_PREFIX))
        .collect()
}

fn tag_with_classes(el: &Element) -> String {
    let classes = visible_classes(el);
    if classes.is_empty() {
        el.tag.clone()
    } else {
        format!("{}.{}", el.tag, classes.join("."))
    }
}

/// Selector for a single element.
///
/// Priority: `data-testid`, then `id`, then `tag.class1.class2`. When none of
/// those distinguishes the element from its bare tag, a `>`-joined path of at
/// most the element plus three ancestors is built, stopping at the body or at
/// the first ancestor carrying an id.
pub fn element_selector<D: Document + ?Sized>(doc: &D, id: NodeId) -> String {
    let Some(el) = doc.element(id) else {
        return String::new();
    };

    if let Some(test_id) = el.test_id() {
        return format!("[data-testid=\"{}\"]", test_id);
    }
    if let Some(element_id) = el.element_id() {
        return format!("#{}", element_id);
    }

    let selector = tag_with_classes(el);
    if selector != el.tag {
        return selector;
    }

    ancestor_path(doc, id)
}

fn ancestor_path<D: Document + ?Sized>(doc: &D, id: NodeId) -> String {
    let body = doc.body();
    let mut parts = Vec::new();
    let mut current = Some(id);

    while let Some(node) = current {
        if node == body || parts.len() > MAX_ANCESTOR_LEVELS {
            break;
        }
        let Some(el) = doc.element(node) else { break };

        if let Some(element_id) = el.element_id() {
            parts.push(format!("#{}", element_id));
            break;
        }

        let segment = tag_with_classes(el);
        if segment != el.tag {
            parts.push(segment);
        } else if let Some(position) = nth_child_position(doc, node) {
            parts.push(format!("{}:nth-child({})", el.tag, position));
        } else {
            parts.push(segment);
        }

        current = el.parent;
    }

    parts.reverse();
    parts.join(" > ")
}

/// 1-based child position, only when a sibling shares the element's tag
fn nth_child_position<D: Document + ?Sized>(doc: &D, id: NodeId) -> Option<usize> {
    let el = doc.element(id)?;
    let parent = doc.element(el.parent?)?;

    let same_tag = parent
        .children
        .iter()
        .filter(|child| doc.element(**child).is_some_and(|c| c.tag == el.tag))
        .count();
    if same_tag < 2 {
        return None;
    }

    parent
        .children
        .iter()
        .position(|child| *child == id)
        .map(|index| index + 1)
}

/// Segment used for each node of a click path: `[data-testid]`, else `tag#id.classes`
fn path_segment(el: &Element) -> String {
    if let Some(test_id) = el.test_id() {
        return format!("[data-testid=\"{}\"]", test_id);
    }

    let mut segment = el.tag.clone();
    if let Some(element_id) = el.element_id() {
        segment.push('#');
        segment.push_str(element_id);
    }
    for class in visible_classes(el) {
        segment.push('.');
        segment.push_str(class);
    }
    segment
}

/// Root-to-target selector built from an event's composed path.
///
/// The trailing document and window entries are skipped.
pub fn click_path<D: Document + ?Sized>(doc: &D, path: &[PathEntry]) -> String {
    let elements = &path[..path.len().saturating_sub(PATH_SENTINELS)];

    let mut segments: Vec<String> = elements
        .iter()
        .filter_map(|entry| match entry {
            PathEntry::Node(id) => doc.element(*id).map(path_segment),
            PathEntry::Document | PathEntry::Window => None,
        })
        .collect();

    segments.reverse();
    segments.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;

    #[test]
    fn test_testid_wins_over_id() {
        let mut doc = DomTree::default();
        let el = doc.append(
            DomTree::BODY,
            Element::new("button").with_id("save").with_attr("data-testid", "submit"),
        );
        assert_eq!(element_selector(&doc, el), "[data-testid=\"submit\"]");
    }

    #[test]
    fn test_id_wins_over_classes() {
        let mut doc = DomTree::default();
        let el = doc.append(DomTree::BODY, Element::new("input").with_id("email").with_class("field"));
        assert_eq!(element_selector(&doc, el), "#email");
    }

    #[test]
    fn test_classes_exclude_marker() {
        let mut doc = DomTree::default();
        let el = doc.append(
            DomTree::BODY,
            Element::new("div").with_class("card staktrak-selection-active wide"),
        );
        assert_eq!(element_selector(&doc, el), "div.card.wide");
    }

    #[test]
    fn test_bare_tag_walks_ancestors_with_nth_child() {
        let mut doc = DomTree::default();
        let list = doc.append(DomTree::BODY, Element::new("ul").with_class("menu"));
        doc.append(list, Element::new("li"));
        let second = doc.append(list, Element::new("li"));
        let span = doc.append(second, Element::new("span"));

        assert_eq!(element_selector(&doc, span), "ul.menu > li:nth-child(2) > span");
    }

    #[test]
    fn test_ancestor_walk_stops_at_id() {
        let mut doc = DomTree::default();
        let outer = doc.append(DomTree::BODY, Element::new("section").with_class("page"));
        let app = doc.append(outer, Element::new("div").with_id("app"));
        let p = doc.append(app, Element::new("p"));

        assert_eq!(element_selector(&doc, p), "#app > p");
    }

    #[test]
    fn test_ancestor_walk_is_bounded() {
        let mut doc = DomTree::default();
        let mut parent = DomTree::BODY;
        for _ in 0..6 {
            parent = doc.append(parent, Element::new("div"));
        }
        let selector = element_selector(&doc, parent);
        assert_eq!(selector.split(" > ").count(), 4);
    }

    #[test]
    fn test_marker_only_classes_fall_back_to_path() {
        let mut doc = DomTree::default();
        let el = doc.append(DomTree::BODY, Element::new("p").with_class("staktrak-highlight"));
        assert_eq!(element_selector(&doc, el), "p");
    }

    #[test]
    fn test_click_path_root_to_target() {
        let mut doc = DomTree::default();
        let app = doc.append(DomTree::BODY, Element::new("div").with_id("app"));
        let button = doc.append(app, Element::new("button").with_class("PrimaryButton"));

        let path = doc.composed_path(button);
        assert_eq!(
            click_path(&doc, &path),
            "html > body > div#app > button.PrimaryButton"
        );
    }

    #[test]
    fn test_click_path_uses_testid_segment() {
        let mut doc = DomTree::default();
        let button = doc.append(
            DomTree::BODY,
            Element::new("button").with_attr("data-testid", "submit"),
        );
        let path = doc.composed_path(button);
        assert_eq!(click_path(&doc, &path), "html > body > [data-testid=\"submit\"]");
    }

    #[test]
    fn test_click_path_short_path() {
        let doc = DomTree::default();
        assert_eq!(click_path(&doc, &[PathEntry::Window]), "");
    }

    #[test]
    fn test_missing_element_is_empty() {
        let doc = DomTree::default();
        assert_eq!(element_selector(&doc, NodeId(99)), "");
    }
}
