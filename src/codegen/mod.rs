//! Playwright test generation
//!
//! Turns a merged [`Trace`](crate::capture::trace::Trace) into the source of a
//! single Playwright `test(...)` block.

pub mod playwright;
pub mod selector;

pub use playwright::{
    generate_playwright_test, generate_playwright_test_with, timeline, SynthesisOptions,
    TimelineEvent, NO_INTERACTIONS_SENTINEL,
};
pub use selector::{convert_to_playwright_selector, escape_single_quoted};
