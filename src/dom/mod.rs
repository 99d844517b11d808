//! Document model
//!
//! The recorder and controller never touch a browser directly. They see a
//! document through the [`Document`] trait and receive raw events as
//! [`DomEvent`] values. [`DomTree`] is the in-memory arena implementation used
//! by tests and session replay.

pub mod document;
pub mod event;
pub mod node;
pub mod tree;

pub use document::{Document, PathEntry, SelectionAnchor, TextSelection};
pub use event::{DomEvent, EventOutcome, TouchKind};
pub use node::{Element, NodeId};
pub use tree::DomTree;
