//! Trace data model
//!
//! The trace is the unit exchanged between recorder and controller and consumed
//! by the synthesizer. Field names follow the camelCase wire format, and every
//! sequence defaults to empty so consumers never branch on absent data.
//!
//! Timestamps are epoch milliseconds throughout; delays are derived later.

use serde::{Deserialize, Serialize};

/// Browser and window facts captured once per session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    /// `(width, height)` of the window's inner viewport
    pub window_size: (u32, u32),
    pub user_agent: String,
    pub platform: String,
}

/// Session timing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraceTime {
    pub start_time: u64,
    pub current_time: u64,
    pub stop_time: u64,
}

/// A recorded click, serialized as `[x, y, selector, timestamp]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, String, u64)", into = "(f64, f64, String, u64)")]
pub struct ClickDetail {
    pub x: f64,
    pub y: f64,
    pub selector: String,
    pub timestamp: u64,
}

impl ClickDetail {
    pub fn new(x: f64, y: f64, selector: impl Into<String>, timestamp: u64) -> Self {
        Self {
            x,
            y,
            selector: selector.into(),
            timestamp,
        }
    }
}

impl From<(f64, f64, String, u64)> for ClickDetail {
    fn from((x, y, selector, timestamp): (f64, f64, String, u64)) -> Self {
        Self {
            x,
            y,
            selector,
            timestamp,
        }
    }
}

impl From<ClickDetail> for (f64, f64, String, u64) {
    fn from(click: ClickDetail) -> Self {
        (click.x, click.y, click.selector, click.timestamp)
    }
}

/// Click log whose count always equals its length.
///
/// The count is recomputed on deserialization, so a sender cannot smuggle in a
/// mismatched pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ClicksRepr")]
pub struct Clicks {
    click_count: usize,
    click_details: Vec<ClickDetail>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Default)]
struct ClicksRepr {
    #[allow(dead_code)]
    click_count: usize,
    click_details: Vec<ClickDetail>,
}

impl From<ClicksRepr> for Clicks {
    fn from(repr: ClicksRepr) -> Self {
        Self {
            click_count: repr.click_details.len(),
            click_details: repr.click_details,
        }
    }
}

impl Clicks {
    pub fn push(&mut self, click: ClickDetail) {
        self.click_details.push(click);
        self.click_count = self.click_details.len();
    }

    /// Append `clicks` and restore time order. Equal timestamps keep their relative order.
    pub fn extend(&mut self, clicks: impl IntoIterator<Item = ClickDetail>) {
        self.click_details.extend(clicks);
        self.click_details.sort_by_key(|click| click.timestamp);
        self.click_count = self.click_details.len();
    }

    pub fn count(&self) -> usize {
        self.click_count
    }

    pub fn details(&self) -> &[ClickDetail] {
        &self.click_details
    }

    pub fn is_empty(&self) -> bool {
        self.click_details.is_empty()
    }
}

/// Sampled pointer position `[x, y, timestamp]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseSample(pub f64, pub f64, pub u64);

/// Scroll offsets `[scrollX, scrollY, timestamp]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSample(pub f64, pub f64, pub u64);

/// Key pressed outside text fields `[key, timestamp]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyActivity(pub String, pub u64);

/// Window resize `[width, height, timestamp]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSizeSample(pub u32, pub u32, pub u64);

/// Page visibility change `[state, timestamp]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilitySample(pub String, pub u64);

/// Whether an input record is a keystroke snapshot or the settled value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputAction {
    Intermediate,
    #[default]
    Complete,
}

/// A value change on a form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "InputChangeRepr")]
pub struct InputChange {
    pub element_selector: String,
    pub value: String,
    pub timestamp: u64,
    pub action: InputAction,
}

impl InputChange {
    pub fn new(
        element_selector: impl Into<String>,
        value: impl Into<String>,
        timestamp: u64,
        action: InputAction,
    ) -> Self {
        Self {
            element_selector: element_selector.into(),
            value: value.into(),
            timestamp,
            action,
        }
    }
}

/// Older traces carry inputs as `[selector, value, timestamp]` tuples
#[derive(Deserialize)]
#[serde(untagged)]
enum InputChangeRepr {
    Record {
        #[serde(rename = "elementSelector")]
        element_selector: String,
        #[serde(default)]
        value: String,
        timestamp: u64,
        #[serde(default)]
        action: InputAction,
    },
    Tuple(String, String, u64),
}

impl From<InputChangeRepr> for InputChange {
    fn from(repr: InputChangeRepr) -> Self {
        match repr {
            InputChangeRepr::Record {
                element_selector,
                value,
                timestamp,
                action,
            } => Self::new(element_selector, value, timestamp, action),
            InputChangeRepr::Tuple(element_selector, value, timestamp) => {
                Self::new(element_selector, value, timestamp, InputAction::Complete)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusKind {
    Focus,
    Blur,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusChange {
    pub element_selector: String,
    #[serde(rename = "type")]
    pub kind: FocusKind,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    PopState,
    PushState,
    LocationChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    #[serde(rename = "type")]
    pub kind: NavigationKind,
    pub url: String,
    pub timestamp: u64,
}

/// Intercepted form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInteraction {
    pub name: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchRecord {
    #[serde(rename = "type")]
    pub kind: crate::dom::TouchKind,
    pub x: f64,
    pub y: f64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Play,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInteraction {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub src: String,
    pub timestamp: u64,
}

/// The four supported assertion checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertionKind {
    /// Exact text match
    HasText,
    /// Substring match
    ContainsText,
    IsVisible,
    /// Form value match
    HasValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    pub selector: String,
    #[serde(default)]
    pub value: String,
    pub timestamp: u64,
}

/// Everything captured during one recording session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trace {
    pub user_info: UserInfo,
    pub time: TraceTime,
    pub clicks: Clicks,
    pub mouse_movements: Vec<MouseSample>,
    pub mouse_scroll: Vec<ScrollSample>,
    pub keyboard_activities: Vec<KeyActivity>,
    pub input_changes: Vec<InputChange>,
    pub focus_changes: Vec<FocusChange>,
    pub navigation_history: Vec<NavigationEntry>,
    pub form_interactions: Vec<FormInteraction>,
    pub touch_events: Vec<TouchRecord>,
    pub media_interactions: Vec<MediaInteraction>,
    pub window_sizes: Vec<WindowSizeSample>,
    #[serde(rename = "visibilitychanges")]
    pub visibility_changes: Vec<VisibilitySample>,
    pub assertions: Vec<Assertion>,
}

impl Trace {
    /// Empty trace whose session starts at `start_time`
    pub fn started_at(start_time: u64) -> Self {
        Self {
            time: TraceTime {
                start_time,
                current_time: start_time,
                stop_time: 0,
            },
            ..Default::default()
        }
    }

    /// Whether anything the synthesizer renders was captured
    pub fn has_interactions(&self) -> bool {
        !self.clicks.is_empty() || !self.input_changes.is_empty() || !self.assertions.is_empty()
    }

    /// Total number of entries across every sequence
    pub fn event_count(&self) -> usize {
        self.clicks.count()
            + self.mouse_movements.len()
            + self.mouse_scroll.len()
            + self.keyboard_activities.len()
            + self.input_changes.len()
            + self.focus_changes.len()
            + self.navigation_history.len()
            + self.form_interactions.len()
            + self.touch_events.len()
            + self.media_interactions.len()
            + self.window_sizes.len()
            + self.visibility_changes.len()
            + self.assertions.len()
    }

    /// Load a trace from a JSON file
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the trace as pretty JSON
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
