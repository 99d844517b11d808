//! Normalization of recorded selectors into Playwright locators

use regex::Regex;
use std::sync::LazyLock;

/// Prefix of selectors that match on visible text
pub const TEXT_MARKER: &str = "text=";

/// `[placeholder="..."]` anywhere in a selector
static PLACEHOLDER_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[placeholder=["']([^"']*)["']\]"#).expect("valid regex")
});

/// `[data-testid="..."]` anywhere in a selector
static TESTID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[data-testid=["']([^"']*)["']\]"#).expect("valid regex")
});

/// Any `[data-*="..."]` attribute fragment
static DATA_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[data-[\w-]+(?:=["'][^"']*["'])?\]"#).expect("valid regex")
});

/// `#id` fragment, up to the next class, attribute or pseudo part
static ID_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[A-Za-z_][\w-]*").expect("valid regex"));

/// Class substrings that mark a segment as something a user interacts with
const INTERACTIVE_KEYWORDS: &[&str] = &[
    "button", "btn", "input", "link", "tab", "menu", "search", "submit", "field", "select",
];

/// Tags collapsed to themselves when nothing else distinguishes them
const COLLAPSIBLE_TAGS: &[&str] = &["input", "textarea"];

/// Value of a `[placeholder="..."]` fragment, if the selector has one
pub fn placeholder_value(selector: &str) -> Option<&str> {
    PLACEHOLDER_ATTR
        .captures(selector)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Convert a raw recorded selector into the locator used in generated tests.
///
/// Rules, first match wins:
/// 1. empty → `body`
/// 2. `text=` markers pass through
/// 3. a `placeholder` attribute is extracted
/// 4. a `data-testid` attribute is extracted
/// 5. a path ending in a bare `input`/`textarea`, with no id or class anywhere,
///    collapses to the tag
/// 6. `>`-joined paths are scanned left to right for an id fragment, then a
///    placeholder fragment, then a `data-*` fragment, then a class fragment
///    naming an interactive role; otherwise the last segment is used
///
/// Anything else is returned trimmed.
pub fn convert_to_playwright_selector(raw: &str) -> String {
    let selector = raw.trim();
    if selector.is_empty() {
        return "body".to_string();
    }
    if selector.starts_with(TEXT_MARKER) {
        return selector.to_string();
    }
    if let Some(placeholder) = placeholder_value(selector) {
        return format!("[placeholder=\"{}\"]", placeholder);
    }
    if let Some(test_id) = TESTID_ATTR.captures(selector).and_then(|c| c.get(1)) {
        return format!("[data-testid=\"{}\"]", test_id.as_str());
    }

    let segments: Vec<&str> = selector
        .split('>')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(tag) = collapsible_tag(selector, &segments) {
        return tag.to_string();
    }
    if segments.len() < 2 {
        return selector.to_string();
    }

    scan_compound(&segments)
}

fn collapsible_tag<'a>(selector: &str, segments: &[&'a str]) -> Option<&'a str> {
    let last = *segments.last()?;
    let tag = last.split(':').next().unwrap_or(last);
    let distinguished = selector.contains('#') || selector.contains('.');
    (!distinguished && COLLAPSIBLE_TAGS.contains(&tag)).then_some(tag)
}

fn scan_compound(segments: &[&str]) -> String {
    if let Some(id) = segments.iter().find_map(|s| ID_FRAGMENT.find(s)) {
        return id.as_str().to_string();
    }
    if let Some(segment) = segments.iter().find(|s| s.contains("[placeholder")) {
        return segment.to_string();
    }
    if let Some(data) = segments.iter().find_map(|s| DATA_ATTR.find(s)) {
        return data.as_str().to_string();
    }
    if let Some(segment) = segments.iter().find(|s| has_interactive_class(s)) {
        return segment.to_string();
    }
    segments
        .last()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "body".to_string())
}

fn has_interactive_class(segment: &str) -> bool {
    segment
        .split('.')
        .skip(1)
        .map(|class| class.split([':', '[']).next().unwrap_or(class).to_lowercase())
        .any(|class| INTERACTIVE_KEYWORDS.iter().any(|kw| class.contains(kw)))
}

/// Escape text for a single-quoted JavaScript string literal
pub fn escape_single_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}
