#![forbid(unsafe_code)]

//! Core primitives for popkit overlays.
//!
//! - [`geometry`]: rectangles, sides, and the pure helpers placement is
//!   built from.
//! - [`event`]: host input events and listener categories.
//! - [`document`]: the [`Document`](document::Document) trait through which
//!   the engine measures, walks, and focuses host elements.
//! - [`memory`]: an in-memory document (tests and `test-helpers` only).

pub mod document;
pub mod event;
pub mod geometry;
#[cfg(feature = "tracing-json")]
pub mod logging;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;

pub use document::{Document, ElementId, SharedDocument};
pub use event::{
    Event, EventFlow, EventKind, EventTarget, KeyCode, KeyEvent, KeyEventKind, Modifiers,
    PointerButton, PointerEvent, PointerEventKind,
};
pub use geometry::{Point, Rect, Side, Size};
