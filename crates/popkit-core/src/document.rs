#![forbid(unsafe_code)]

//! Host document abstraction.
//!
//! The overlay engine never touches a real DOM. Everything it needs from the
//! host (measuring boxes, walking the element tree, moving focus, setting
//! accessibility attributes) goes through the [`Document`] trait, so the
//! engine can run against a browser binding, a native toolkit, or the
//! in-memory [`MemoryDocument`](crate::memory::MemoryDocument) used in tests.
//!
//! # Invariants
//!
//! 1. An [`ElementId`] is an identity, never an owner: holding one does not
//!    keep the element alive, and every query must tolerate the element
//!    having been removed ([`Document::is_attached`] returns `false`).
//! 2. [`Document::contains`] is inclusive: an element contains itself.
//! 3. [`Document::focusable_descendants`] returns elements in sequential
//!    (Tab) navigation order and never includes the root itself.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::geometry::Rect;

/// Opaque identity of an element in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Queries and commands the overlay engine issues against the host.
pub trait Document {
    /// The visible viewport in the same coordinate space as element rects.
    fn viewport(&self) -> Rect;

    /// Whether the element is still part of the document.
    fn is_attached(&self, id: ElementId) -> bool;

    /// The element's border box, if the host can measure it.
    fn client_rect(&self, id: ElementId) -> Option<Rect>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    /// Tab-reachable descendants of `root`, in navigation order.
    fn focusable_descendants(&self, root: ElementId) -> Vec<ElementId>;

    /// Ancestors of `id` that scroll their content, innermost first.
    fn scrollable_ancestors(&self, id: ElementId) -> Vec<ElementId>;

    /// The element that currently has keyboard focus.
    fn active_element(&self) -> Option<ElementId>;

    /// Move focus to `id`. Returns `false` if the element cannot take focus.
    fn focus(&mut self, id: ElementId) -> bool;

    /// Allow `id` to receive focus programmatically (outside Tab order).
    fn make_programmatically_focusable(&mut self, id: ElementId);

    fn set_attribute(&mut self, id: ElementId, name: &str, value: &str);

    fn remove_attribute(&mut self, id: ElementId, name: &str);

    /// The element's rect if it is attached and measurable.
    ///
    /// This is the check placement runs before every computation; a `None`
    /// here means "skip and keep the previous placement".
    fn measurable_rect(&self, id: ElementId) -> Option<Rect> {
        if !self.is_attached(id) {
            return None;
        }
        self.client_rect(id).filter(Rect::is_measurable)
    }
}

/// Shared, single-threaded handle to the host document.
pub type SharedDocument = Rc<RefCell<dyn Document>>;
