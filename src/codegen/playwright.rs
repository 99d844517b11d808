//! Playwright test assembly
//!
//! Pure function of `(url, trace, options)`: nothing here reads the clock, so
//! the same trace always produces byte-identical source.

use super::selector::{convert_to_playwright_selector, escape_single_quoted, placeholder_value, TEXT_MARKER};
use crate::app::config::SynthesizerConfig;
use crate::capture::trace::{Assertion, AssertionKind, ClickDetail, InputChange, Trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write;

/// Comment emitted when a trace has nothing to replay
pub const NO_INTERACTIONS_SENTINEL: &str = "// No interactions were recorded";

const INDENT: &str = "  ";

/// Timestamps at or above this are epoch milliseconds (September 2001 onwards)
const EPOCH_SCALE_MS: u64 = 1_000_000_000_000;

/// Options for test generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    /// Title of the `test(...)` block
    pub test_name: String,
    /// Viewport when the trace carries no window size
    pub fallback_viewport: (u32, u32),
    /// Gaps at or below this are not reproduced (ms)
    pub min_wait_ms: u64,
    /// Trailing settle wait (ms)
    pub final_wait_ms: u64,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self::from(&SynthesizerConfig::default())
    }
}

impl From<&SynthesizerConfig> for SynthesisOptions {
    fn from(config: &SynthesizerConfig) -> Self {
        Self {
            test_name: config.test_name.clone(),
            fallback_viewport: config.fallback_viewport,
            min_wait_ms: config.min_wait_ms,
            final_wait_ms: config.final_wait_ms,
        }
    }
}

/// One replayable step, borrowed from the trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEvent<'a> {
    Click(&'a ClickDetail),
    Input(&'a InputChange),
    Assertion(&'a Assertion),
}

impl TimelineEvent<'_> {
    pub fn timestamp(&self) -> u64 {
        match self {
            TimelineEvent::Click(click) => click.timestamp,
            TimelineEvent::Input(input) => input.timestamp,
            TimelineEvent::Assertion(assertion) => assertion.timestamp,
        }
    }

    fn is_assertion(&self) -> bool {
        matches!(self, TimelineEvent::Assertion(_))
    }
}

/// Latest record per selector, in the order the winners were recorded.
///
/// On equal timestamps the later record wins.
pub fn latest_inputs(inputs: &[InputChange]) -> Vec<&InputChange> {
    let mut winners: HashMap<&str, usize> = HashMap::new();
    for (index, input) in inputs.iter().enumerate() {
        let replace = winners
            .get(input.element_selector.as_str())
            .is_none_or(|current| input.timestamp >= inputs[*current].timestamp);
        if replace {
            winners.insert(input.element_selector.as_str(), index);
        }
    }

    let mut indices: Vec<usize> = winners.into_values().collect();
    indices.sort_unstable();
    indices.into_iter().map(|i| &inputs[i]).collect()
}

/// Clicks, deduplicated inputs and assertions merged into one time-ordered list.
///
/// The sort is stable: equal timestamps keep clicks before inputs before
/// assertions, and recording order within each kind.
pub fn timeline(trace: &Trace) -> Vec<TimelineEvent<'_>> {
    let mut events: Vec<TimelineEvent<'_>> = trace
        .clicks
        .details()
        .iter()
        .map(TimelineEvent::Click)
        .chain(
            latest_inputs(&trace.input_changes)
                .into_iter()
                .map(TimelineEvent::Input),
        )
        .chain(trace.assertions.iter().map(TimelineEvent::Assertion))
        .collect();
    events.sort_by_key(TimelineEvent::timestamp);
    events
}

/// Generate a Playwright test with default options
pub fn generate_playwright_test(url: &str, trace: &Trace) -> String {
    generate_playwright_test_with(url, trace, &SynthesisOptions::default())
}

/// Generate a Playwright test
pub fn generate_playwright_test_with(url: &str, trace: &Trace, options: &SynthesisOptions) -> String {
    let mut builder = PlaywrightBuilder::new(options);
    builder.build(url, trace)
}

/// Source buffer for one generated test
struct PlaywrightBuilder<'o> {
    buffer: String,
    options: &'o SynthesisOptions,
}

impl<'o> PlaywrightBuilder<'o> {
    fn new(options: &'o SynthesisOptions) -> Self {
        Self {
            buffer: String::with_capacity(2048),
            options,
        }
    }

    fn build(&mut self, url: &str, trace: &Trace) -> String {
        self.buffer.clear();
        // Writing into a String does not fail.
        self.write_test(url, trace).ok();
        std::mem::take(&mut self.buffer)
    }

    fn write_test(&mut self, url: &str, trace: &Trace) -> std::fmt::Result {
        writeln!(self.buffer, "import {{ test, expect }} from '@playwright/test';")?;
        writeln!(self.buffer)?;
        writeln!(
            self.buffer,
            "test('{}', async ({{ page }}) => {{",
            escape_single_quoted(&self.options.test_name)
        )?;
        self.write_setup(url, trace)?;

        if trace.has_interactions() {
            self.write_steps(trace)?;
        } else {
            writeln!(self.buffer, "{INDENT}{NO_INTERACTIONS_SENTINEL}")?;
        }

        writeln!(
            self.buffer,
            "{INDENT}await page.waitForTimeout({});",
            self.options.final_wait_ms
        )?;
        writeln!(self.buffer, "}});")?;
        Ok(())
    }

    fn write_setup(&mut self, url: &str, trace: &Trace) -> std::fmt::Result {
        let (width, height) = match trace.user_info.window_size {
            (w, h) if w > 0 && h > 0 => (w, h),
            _ => self.options.fallback_viewport,
        };
        writeln!(
            self.buffer,
            "{INDENT}await page.setViewportSize({{ width: {width}, height: {height} }});"
        )?;
        writeln!(self.buffer, "{INDENT}await page.goto('{}');", escape_single_quoted(url))?;
        writeln!(self.buffer)?;
        Ok(())
    }

    fn write_steps(&mut self, trace: &Trace) -> std::fmt::Result {
        let events = timeline(trace);
        let mut previous = match (trace.time.start_time, events.first()) {
            // Epoch timestamps without a start time would wait for decades.
            (0, Some(first)) if first.timestamp() >= EPOCH_SCALE_MS => first.timestamp(),
            (start, _) => start,
        };

        for event in &events {
            let timestamp = event.timestamp();
            let gap = timestamp.saturating_sub(previous);
            if !event.is_assertion() && gap > self.options.min_wait_ms {
                writeln!(self.buffer, "{INDENT}await page.waitForTimeout({gap});")?;
            }
            previous = timestamp;

            match event {
                TimelineEvent::Click(click) => self.write_click(click)?,
                TimelineEvent::Input(input) => self.write_input(input)?,
                TimelineEvent::Assertion(assertion) => self.write_assertion(assertion)?,
            }
        }
        writeln!(self.buffer)?;
        Ok(())
    }

    fn write_click(&mut self, click: &ClickDetail) -> std::fmt::Result {
        let locator = locator(&click.selector);
        writeln!(
            self.buffer,
            "{INDENT}await {locator}.waitFor({{ state: 'visible' }});"
        )?;
        writeln!(self.buffer, "{INDENT}await {locator}.click();")
    }

    fn write_input(&mut self, input: &InputChange) -> std::fmt::Result {
        let selector = convert_to_playwright_selector(&input.element_selector);
        let value = escape_single_quoted(&input.value);

        if selector.starts_with(TEXT_MARKER) {
            let locator = locator(&selector);
            writeln!(self.buffer, "{INDENT}await {locator}.click();")?;
            writeln!(self.buffer, "{INDENT}await page.keyboard.insertText('{value}');")
        } else if let Some(placeholder) = placeholder_value(&selector) {
            writeln!(
                self.buffer,
                "{INDENT}await page.getByPlaceholder('{}').fill('{value}');",
                escape_single_quoted(placeholder)
            )
        } else {
            let locator = locator(&selector);
            writeln!(self.buffer, "{INDENT}await {locator}.fill('{value}');")
        }
    }

    fn write_assertion(&mut self, assertion: &Assertion) -> std::fmt::Result {
        let locator = locator(&assertion.selector);
        let value = escape_single_quoted(&assertion.value);
        match assertion.kind {
            AssertionKind::HasText => writeln!(
                self.buffer,
                "{INDENT}await expect({locator}).toHaveText('{value}');"
            ),
            AssertionKind::ContainsText => writeln!(
                self.buffer,
                "{INDENT}await expect({locator}).toContainText('{value}');"
            ),
            AssertionKind::IsVisible => {
                writeln!(self.buffer, "{INDENT}await expect({locator}).toBeVisible();")
            }
            AssertionKind::HasValue => writeln!(
                self.buffer,
                "{INDENT}await expect({locator}).toHaveValue('{value}');"
            ),
        }
    }
}

/// `page.locator('...')` for a raw recorded selector
fn locator(raw: &str) -> String {
    format!(
        "page.locator('{}')",
        escape_single_quoted(&convert_to_playwright_selector(raw))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::trace::{InputAction, UserInfo};

    fn trace_with_viewport() -> Trace {
        let mut trace = Trace::started_at(1_000);
        trace.user_info = UserInfo {
            window_size: (1440, 900),
            ..Default::default()
        };
        trace
    }

    #[test]
    fn test_empty_trace_uses_template() {
        let script = generate_playwright_test("https://app.test/", &Trace::default());
        assert!(script.contains(NO_INTERACTIONS_SENTINEL));
        assert!(script.contains("width: 1280, height: 720"));
        assert!(script.contains("await page.goto('https://app.test/');"));
        assert!(script.trim_end().ends_with("});"));
    }

    #[test]
    fn test_click_then_input_with_waits() {
        let mut trace = trace_with_viewport();
        trace
            .clicks
            .push(ClickDetail::new(10.0, 20.0, "[data-testid=\"new\"]", 1_500));
        trace.input_changes.push(InputChange::new(
            "#title",
            "Fix login",
            1_550,
            InputAction::Complete,
        ));

        let script = generate_playwright_test("https://app.test/", &trace);
        let expected = "\
  await page.waitForTimeout(500);
  await page.locator('[data-testid=\"new\"]').waitFor({ state: 'visible' });
  await page.locator('[data-testid=\"new\"]').click();
  await page.locator('#title').fill('Fix login');
";
        assert!(script.contains(expected), "{script}");
        assert!(script.contains("width: 1440, height: 900"));
    }

    #[test]
    fn test_input_branches() {
        let mut trace = trace_with_viewport();
        trace.input_changes.push(InputChange::new(
            "text=Message",
            "hi",
            1_000,
            InputAction::Complete,
        ));
        trace.input_changes.push(InputChange::new(
            "input[placeholder=\"Search\"]",
            "rust",
            1_000,
            InputAction::Complete,
        ));

        let script = generate_playwright_test("https://app.test/", &trace);
        assert!(script.contains("await page.locator('text=Message').click();"));
        assert!(script.contains("await page.keyboard.insertText('hi');"));
        assert!(script.contains("await page.getByPlaceholder('Search').fill('rust');"));
    }

    #[test]
    fn test_assertion_kinds() {
        let mut trace = trace_with_viewport();
        for (i, kind) in [
            AssertionKind::HasText,
            AssertionKind::ContainsText,
            AssertionKind::IsVisible,
            AssertionKind::HasValue,
        ]
        .into_iter()
        .enumerate()
        {
            trace.assertions.push(Assertion {
                kind,
                selector: "h1.title".into(),
                value: "Bounties".into(),
                timestamp: 5_000 + i as u64,
            });
        }

        let script = generate_playwright_test("https://app.test/", &trace);
        assert!(script.contains("await expect(page.locator('h1.title')).toHaveText('Bounties');"));
        assert!(script.contains("toContainText('Bounties');"));
        assert!(script.contains("await expect(page.locator('h1.title')).toBeVisible();"));
        assert!(script.contains("toHaveValue('Bounties');"));
        // Assertions never get a wait in front of them.
        assert_eq!(script.matches("waitForTimeout").count(), 1);
    }

    #[test]
    fn test_latest_inputs_keeps_final_record() {
        let inputs = vec![
            InputChange::new("#q", "r", 10, InputAction::Intermediate),
            InputChange::new("#other", "x", 11, InputAction::Complete),
            InputChange::new("#q", "ru", 12, InputAction::Intermediate),
            InputChange::new("#q", "rust", 12, InputAction::Complete),
        ];
        let latest = latest_inputs(&inputs);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].element_selector, "#other");
        assert_eq!(latest[1].value, "rust");
    }

    #[test]
    fn test_timeline_is_stable_on_ties() {
        let mut trace = Trace::started_at(0);
        trace.assertions.push(Assertion {
            kind: AssertionKind::IsVisible,
            selector: "#a".into(),
            value: String::new(),
            timestamp: 100,
        });
        trace.clicks.push(ClickDetail::new(0.0, 0.0, "#b", 100));
        trace.clicks.push(ClickDetail::new(0.0, 0.0, "#c", 100));

        let kinds: Vec<String> = timeline(&trace)
            .iter()
            .map(|e| match e {
                TimelineEvent::Click(c) => c.selector.clone(),
                TimelineEvent::Input(i) => i.element_selector.clone(),
                TimelineEvent::Assertion(a) => a.selector.clone(),
            })
            .collect();
        assert_eq!(kinds, vec!["#b", "#c", "#a"]);
    }

    #[test]
    fn test_zero_start_time_waits_from_zero() {
        let mut trace = Trace::started_at(0);
        trace
            .clicks
            .push(ClickDetail::new(100.0, 200.0, "[data-testid=\"submit\"]", 1_000));
        let script = generate_playwright_test("https://app.test/", &trace);

        let wait = script.find("await page.waitForTimeout(1000);").unwrap();
        let click = script.find(".click();").unwrap();
        assert!(wait < click);
        assert_eq!(script.matches("waitForTimeout").count(), 2);
    }

    #[test]
    fn test_missing_start_time_does_not_wait_from_epoch() {
        let mut trace = Trace::default();
        trace
            .clicks
            .push(ClickDetail::new(0.0, 0.0, "#go", 1_700_000_000_000));
        let script = generate_playwright_test("https://app.test/", &trace);
        assert_eq!(script.matches("waitForTimeout").count(), 1);
    }

    #[test]
    fn test_empty_selector_targets_body() {
        let mut trace = Trace::started_at(0);
        trace.clicks.push(ClickDetail::new(0.0, 0.0, "", 0));
        let script = generate_playwright_test("https://app.test/", &trace);
        assert!(script.contains("await page.locator('body').click();"));
    }

    #[test]
    fn test_options_override_name_and_waits() {
        let options = SynthesisOptions {
            test_name: "Creates a bounty".into(),
            final_wait_ms: 250,
            ..Default::default()
        };
        let script = generate_playwright_test_with("https://app.test/", &Trace::default(), &options);
        assert!(script.contains("test('Creates a bounty', async ({ page }) => {"));
        assert!(script.contains("await page.waitForTimeout(250);"));
    }
}
