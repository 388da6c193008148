#![forbid(unsafe_code)]

//! Focus trapping for open overlays.
//!
//! [`FocusTrap::activate`] records where focus was, moves it into the
//! overlay and installs a keydown interceptor that keeps Tab navigation
//! inside the trap root. [`FocusTrap::deactivate`] consumes the resulting
//! [`FocusContext`], removes the interceptor and puts focus back.
//!
//! # Invariants
//!
//! - The previously focused element is held by identity only; if it was
//!   detached while the overlay was open, restoration is skipped.
//! - With `wrap`, Tab on the last focusable descendant moves to the first
//!   and Shift+Tab on the first moves to the last.
//! - Without `wrap`, Tab on the last descendant is the only way out: it is
//!   left to the host so a Tab-out dismissal can close the overlay.
//!   Shift+Tab on the first descendant keeps focus where it is.
//! - Tab presses in the middle of the list are left to the host; presses
//!   while focus is outside the trap pull it back in.
//! - A trap root with no focusable descendants keeps focus on the root and
//!   swallows Tab in both directions.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Initial target detached | Content re-rendered | Falls back to first focusable, then root |
//! | Previous element detached | Trigger unmounted | No restoration |
//! | Context dropped without `deactivate` | Owner dropped | Interceptor removed, focus left alone |

use std::fmt;
use std::rc::Rc;

use popkit_core::document::{ElementId, SharedDocument};
use popkit_core::event::{Event, EventFlow, EventKind, EventTarget};
use popkit_runtime::{EventBus, ListenOptions, Subscription};

/// Live focus-trap state for one open cycle.
pub struct FocusContext {
    document: SharedDocument,
    previously_focused: Option<ElementId>,
    trap_root: ElementId,
    initial_focus_target: ElementId,
    wraps: bool,
    interceptor: Option<Subscription>,
}

impl FocusContext {
    /// The element that had focus when the trap was activated.
    #[must_use]
    pub fn previously_focused(&self) -> Option<ElementId> {
        self.previously_focused
    }

    #[must_use]
    pub fn trap_root(&self) -> ElementId {
        self.trap_root
    }

    /// The element focus was moved to on activation.
    #[must_use]
    pub fn initial_focus_target(&self) -> ElementId {
        self.initial_focus_target
    }

    /// Whether Tab wraps inside the trap root.
    #[must_use]
    pub fn wraps(&self) -> bool {
        self.wraps
    }
}

impl fmt::Debug for FocusContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusContext")
            .field("previously_focused", &self.previously_focused)
            .field("trap_root", &self.trap_root)
            .field("initial_focus_target", &self.initial_focus_target)
            .field("wraps", &self.wraps)
            .finish()
    }
}

/// Focus trap operations.
pub struct FocusTrap;

impl FocusTrap {
    /// Move focus into `trap_root` and start trapping.
    pub fn activate(
        document: &SharedDocument,
        bus: &EventBus,
        trap_root: ElementId,
        initial_focus: Option<ElementId>,
        wrap: bool,
    ) -> FocusContext {
        let (previously_focused, initial_focus_target) = {
            let mut doc = document.borrow_mut();
            let previous = doc.active_element();

            let requested = initial_focus.filter(|id| doc.is_attached(*id));
            let target = match requested {
                Some(id) if doc.focus(id) => id,
                _ => {
                    let first = doc.focusable_descendants(trap_root).into_iter().next();
                    match first {
                        Some(id) if doc.focus(id) => id,
                        _ => {
                            doc.make_programmatically_focusable(trap_root);
                            doc.focus(trap_root);
                            trap_root
                        }
                    }
                }
            };
            (previous, target)
        };

        let interceptor = {
            let doc = Rc::clone(document);
            bus.listen(
                EventTarget::Document,
                EventKind::KeyDown,
                ListenOptions::default(),
                move |event| contain_tab(&doc, trap_root, wrap, event),
            )
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            trap_root = %trap_root,
            focused = %initial_focus_target,
            wrap,
            "focus trap activated"
        );

        FocusContext {
            document: Rc::clone(document),
            previously_focused,
            trap_root,
            initial_focus_target,
            wraps: wrap,
            interceptor: Some(interceptor),
        }
    }

    /// Stop trapping. Returns whether focus was restored.
    pub fn deactivate(mut context: FocusContext, restore_focus: bool) -> bool {
        drop(context.interceptor.take());
        if !restore_focus {
            return false;
        }
        let Some(previous) = context.previously_focused else {
            return false;
        };
        let mut doc = context.document.borrow_mut();
        let restored = doc.is_attached(previous) && doc.focus(previous);

        #[cfg(feature = "tracing")]
        tracing::debug!(previous = %previous, restored, "focus trap deactivated");

        restored
    }
}

fn contain_tab(
    document: &SharedDocument,
    trap_root: ElementId,
    wrap: bool,
    event: &Event,
) -> EventFlow {
    let Event::Key(key) = event else {
        return EventFlow::Continue;
    };
    let forward = key.is_tab_forward();
    if !forward && !key.is_tab_backward() {
        return EventFlow::Continue;
    }

    let mut doc = document.borrow_mut();
    let focusables = doc.focusable_descendants(trap_root);
    let (Some(&first), Some(&last)) = (focusables.first(), focusables.last()) else {
        return EventFlow::Prevent;
    };
    let active = doc.active_element();
    let inside = active.is_some_and(|a| focusables.contains(&a));
    let target = match (forward, inside) {
        (true, false) => first,
        (false, false) => last,
        (true, true) if active == Some(last) => {
            if !wrap {
                return EventFlow::Continue;
            }
            first
        }
        (false, true) if active == Some(first) => {
            if wrap {
                last
            } else {
                first
            }
        }
        _ => return EventFlow::Continue,
    };
    doc.focus(target);
    EventFlow::Prevent
}
