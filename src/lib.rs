//! # staktrak
//!
//! Records user interactions inside a web document and turns them into an
//! executable Playwright test.
//!
//! ## Overview
//!
//! Three components, from leaf to root:
//!
//! - [`capture`]: the in-document [`Recorder`]. It listens to raw DOM events,
//!   normalizes them into a [`Trace`] and answers `start`/`stop`/selection
//!   directives received over a message port.
//! - [`controller`]: the host-side [`RecordingController`]. It toggles recording
//!   on embedded frames, captures clicks and inputs in its own document, merges
//!   both streams and hands the result to the synthesizer, with a timeout
//!   fallback when no frame answers.
//! - [`codegen`]: the pure synthesizer turning `(url, trace)` into test source.
//!
//! ## Quick Start
//!
//! ```
//! use staktrak::capture::trace::{ClickDetail, Trace};
//! use staktrak::codegen::generate_playwright_test;
//!
//! let mut trace = Trace::started_at(10_000);
//! trace.clicks.push(ClickDetail::new(100.0, 200.0, "[data-testid=\"submit\"]", 11_500));
//!
//! let script = generate_playwright_test("https://app.test/bounties", &trace);
//! assert!(script.contains("await page.waitForTimeout(1500);"));
//! assert!(script.contains("await page.locator('[data-testid=\"submit\"]').click();"));
//! ```
//!
//! ## Event Pipeline
//!
//! ```text
//! ┌─────────────┐  staktrak-results  ┌─────────────┐  merged trace  ┌─────────────┐
//! │  Recorder   │───────────────────▶│ Controller  │───────────────▶│ Synthesizer │
//! │  (frame)    │◀───────────────────│  (host)     │                │ (Playwright)│
//! └─────────────┘  start/stop/select └─────────────┘                └─────────────┘
//! ```
//!
//! Everything is single-threaded and cooperative. Timers are explicit values
//! fired by `run_due_timers`/`poll`, driven by an injected [`time::Clock`].

pub mod app;
pub mod capture;
pub mod codegen;
pub mod controller;
pub mod dom;
pub mod protocol;
pub mod time;
pub mod workflow;

// Re-export commonly used types
pub use capture::recorder::Recorder;
pub use capture::trace::Trace;
pub use codegen::{convert_to_playwright_selector, generate_playwright_test};
pub use controller::RecordingController;
pub use protocol::Message;

/// Result type alias for staktrak
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for staktrak
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Message delivery failed: {0}")]
    Delivery(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
