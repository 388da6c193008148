#![forbid(unsafe_code)]

//! Stack of nested overlays.
//!
//! Nested overlays (a submenu inside a menu, a date picker inside a popup)
//! close in LIFO order. [`OverlayStack`] tracks open controllers in the
//! order they opened so a host can route "close the innermost overlay"
//! gestures to the right one.
//!
//! # Invariants
//!
//! - Entries are ordered by opening time; the last entry is on top.
//! - Overlays that closed on their own are pruned before every query.
//! - A controller appears at most once.
//!
//! # Failure Modes
//!
//! - `close_top()` on an empty stack returns `None` (no panic).
//! - `remove()` for an untracked controller returns `false`.

use super::controller::OverlayController;
use super::dismiss::DismissReason;

/// LIFO stack of open overlays.
#[derive(Debug, Default)]
pub struct OverlayStack {
    entries: Vec<OverlayController>,
}

impl OverlayStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `controller` and push it on top. Returns `false` if it was
    /// already open.
    pub fn open(&mut self, controller: &OverlayController) -> bool {
        let opened = controller.request_open();
        if opened {
            self.push(controller);
        }
        opened
    }

    /// Track an already-open controller. Returns `false` if it is closed
    /// or already tracked.
    pub fn push(&mut self, controller: &OverlayController) -> bool {
        self.prune();
        if !controller.is_open() || self.contains(controller) {
            return false;
        }
        self.entries.push(controller.clone());
        true
    }

    /// The innermost open overlay.
    pub fn top(&mut self) -> Option<&OverlayController> {
        self.prune();
        self.entries.last()
    }

    /// Close and pop the innermost open overlay.
    pub fn close_top(&mut self, reason: DismissReason) -> Option<OverlayController> {
        self.prune();
        let top = self.entries.pop()?;
        top.request_close(reason);
        #[cfg(feature = "tracing")]
        tracing::debug!(%reason, depth = self.entries.len(), "closed top overlay");
        Some(top)
    }

    /// Close every overlay, innermost first. Returns how many closed.
    pub fn close_all(&mut self, reason: DismissReason) -> usize {
        let mut closed = 0;
        while self.close_top(reason).is_some() {
            closed += 1;
        }
        closed
    }

    /// Stop tracking `controller` without closing it.
    pub fn remove(&mut self, controller: &OverlayController) -> bool {
        let before = self.entries.len();
        self.entries.retain(|c| !c.ptr_eq(controller));
        self.entries.len() != before
    }

    #[must_use]
    pub fn contains(&self, controller: &OverlayController) -> bool {
        self.entries.iter().any(|c| c.ptr_eq(controller))
    }

    /// Number of tracked overlays that are still open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.iter().filter(|c| c.is_open()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    fn prune(&mut self) {
        self.entries.retain(OverlayController::is_open);
    }
}
