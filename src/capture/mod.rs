//! In-document capture
//!
//! The [`Recorder`] turns raw DOM events into a [`Trace`]. Selector inference
//! for the recorded elements lives in [`selector`].

pub mod recorder;
pub mod selector;
pub mod trace;

pub use recorder::{Recorder, RecorderState, SELECTION_CLASS};
pub use selector::{click_path, element_selector};
pub use trace::{ClickDetail, InputAction, InputChange, Trace};
