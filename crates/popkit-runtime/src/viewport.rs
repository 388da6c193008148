#![forbid(unsafe_code)]

//! Viewport observation for open overlays.
//!
//! While an overlay is open its placement goes stale whenever the page
//! scrolls (the window or any scroll container between the anchor and the
//! root) or the window resizes. [`ViewportObserver::observe`] attaches the
//! necessary listeners and funnels them into a single recompute callback,
//! coalesced to at most one call per animation frame.
//!
//! # Invariants
//!
//! 1. Scroll listeners are passive; the observer never prevents scrolling.
//! 2. Any number of events between two frames yields exactly one recompute.
//! 3. Releasing the [`ViewportObservation`] removes every listener and
//!    cancels a recompute that was queued but has not run.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Anchor detached at observe time | Trigger unmounted | Window listeners only |
//! | Observation leaked | Caller never releases | Listeners stay registered (owner bug) |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use popkit_core::document::{ElementId, SharedDocument};
use popkit_core::event::{EventFlow, EventKind, EventTarget};
use web_time::Instant;

use crate::event_bus::{EventBus, ListenOptions};
use crate::frame::FrameScheduler;
use crate::reactive::{BindingScope, Subscription};

/// Recompute bookkeeping for one observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverStats {
    /// Scroll/resize events received.
    pub events: u64,
    /// Recompute callbacks actually run.
    pub recomputes: u64,
    /// When the last recompute ran.
    pub last_recompute: Option<Instant>,
}

struct Shared {
    scheduler: FrameScheduler,
    on_recompute: Box<dyn Fn()>,
    pending: RefCell<Option<Subscription>>,
    stats: RefCell<ObserverStats>,
}

impl Shared {
    fn on_event(self: &Rc<Self>) {
        self.stats.borrow_mut().events += 1;
        if self.pending.borrow().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let frame = self.scheduler.request_frame(move || {
            if let Some(shared) = weak.upgrade() {
                shared.run();
            }
        });
        *self.pending.borrow_mut() = Some(frame);
    }

    fn run(&self) {
        // Already consumed by the frame; dropping it is a no-op.
        drop(self.pending.borrow_mut().take());
        {
            let mut stats = self.stats.borrow_mut();
            stats.recomputes += 1;
            stats.last_recompute = Some(Instant::now());
        }
        (self.on_recompute)();
    }
}

/// Entry point for attaching viewport listeners.
pub struct ViewportObserver;

impl ViewportObserver {
    /// Watch scroll and resize on behalf of the overlay anchored at
    /// `anchor`. `on_recompute` runs at most once per frame while the
    /// returned observation is alive.
    pub fn observe(
        bus: &EventBus,
        scheduler: &FrameScheduler,
        document: &SharedDocument,
        anchor: ElementId,
        on_recompute: impl Fn() + 'static,
    ) -> ViewportObservation {
        let shared = Rc::new(Shared {
            scheduler: scheduler.clone(),
            on_recompute: Box::new(on_recompute),
            pending: RefCell::new(None),
            stats: RefCell::new(ObserverStats::default()),
        });

        let mut targets = vec![EventTarget::Window];
        {
            let doc = document.borrow();
            if doc.is_attached(anchor) {
                targets.extend(
                    doc.scrollable_ancestors(anchor)
                        .into_iter()
                        .map(EventTarget::Element),
                );
            }
        }

        let mut scope = BindingScope::new();
        for target in &targets {
            let s = Rc::clone(&shared);
            scope.hold(bus.listen(*target, EventKind::Scroll, ListenOptions::PASSIVE, move |_| {
                s.on_event();
                EventFlow::Continue
            }));
        }
        let s = Rc::clone(&shared);
        scope.hold(bus.listen(
            EventTarget::Window,
            EventKind::Resize,
            ListenOptions::PASSIVE,
            move |_| {
                s.on_event();
                EventFlow::Continue
            },
        ));

        tracing::debug!(
            %anchor,
            scroll_targets = targets.len(),
            "viewport observer armed"
        );

        ViewportObservation { scope, shared }
    }
}

/// A live set of viewport listeners. Release to disarm.
pub struct ViewportObservation {
    scope: BindingScope,
    shared: Rc<Shared>,
}

impl ViewportObservation {
    /// Number of listeners this observation holds.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.scope.binding_count()
    }

    #[must_use]
    pub fn stats(&self) -> ObserverStats {
        *self.shared.stats.borrow()
    }

    /// Whether a recompute is queued for the next frame.
    #[must_use]
    pub fn has_pending_recompute(&self) -> bool {
        self.shared.pending.borrow().is_some()
    }

    /// Remove every listener and cancel any queued recompute.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.scope.is_empty() {
            return;
        }
        self.scope.clear();
        drop(self.shared.pending.borrow_mut().take());
        tracing::debug!(stats = ?self.stats(), "viewport observer disarmed");
    }
}

impl Drop for ViewportObservation {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ViewportObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportObservation")
            .field("listeners", &self.listener_count())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use popkit_core::event::Event;
    use popkit_core::memory::MemoryDocument;
    use popkit_core::{Rect, Size};
    use std::cell::Cell;
    use tracing_test::traced_test;

    struct Fixture {
        bus: EventBus,
        scheduler: FrameScheduler,
        document: SharedDocument,
        anchor: ElementId,
        scroller: ElementId,
    }

    fn fixture() -> Fixture {
        let mut doc = MemoryDocument::new(Size::new(800.0, 600.0));
        let scroller = doc.create(None, Rect::new(0.0, 0.0, 400.0, 400.0));
        doc.set_scrollable(scroller, true);
        let anchor = doc.create(Some(scroller), Rect::new(10.0, 10.0, 100.0, 30.0));
        Fixture {
            bus: EventBus::new(),
            scheduler: FrameScheduler::new(),
            document: doc.into_shared(),
            anchor,
            scroller,
        }
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn listens_on_window_ancestors_and_resize() {
        let f = fixture();
        let (_, cb) = counter();
        let obs = ViewportObserver::observe(&f.bus, &f.scheduler, &f.document, f.anchor, cb);
        // window scroll + scroller scroll + window resize
        assert_eq!(obs.listener_count(), 3);
        assert_eq!(f.bus.listener_count_for(EventKind::Scroll), 2);
        assert_eq!(f.bus.listener_count_for(EventKind::Resize), 1);
    }

    #[test]
    fn events_coalesce_per_frame() {
        let f = fixture();
        let (count, cb) = counter();
        let obs = ViewportObserver::observe(&f.bus, &f.scheduler, &f.document, f.anchor, cb);

        f.bus.dispatch(&Event::Scroll(EventTarget::Window));
        f.bus.dispatch(&Event::Scroll(EventTarget::Element(f.scroller)));
        f.bus.dispatch(&Event::Resize(Size::new(700.0, 500.0)));
        assert_eq!(count.get(), 0, "nothing runs before the frame");
        assert!(obs.has_pending_recompute());

        f.scheduler.run_frame();
        assert_eq!(count.get(), 1);
        assert_eq!(obs.stats().events, 3);
        assert_eq!(obs.stats().recomputes, 1);
        assert!(obs.stats().last_recompute.is_some());

        f.bus.dispatch(&Event::Scroll(EventTarget::Window));
        f.scheduler.run_frame();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn dispose_removes_listeners_and_pending_frame() {
        let f = fixture();
        let (count, cb) = counter();
        let obs = ViewportObserver::observe(&f.bus, &f.scheduler, &f.document, f.anchor, cb);
        f.bus.dispatch(&Event::Scroll(EventTarget::Window));
        assert_eq!(f.scheduler.pending(), 1);

        obs.dispose();
        assert_eq!(f.bus.listener_count(), 0);
        assert_eq!(f.scheduler.pending(), 0);
        f.scheduler.run_frame();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn detached_anchor_observes_window_only() {
        let f = fixture();
        let mut doc = MemoryDocument::new(Size::new(100.0, 100.0));
        let scroller = doc.create(None, Rect::new(0.0, 0.0, 50.0, 50.0));
        doc.set_scrollable(scroller, true);
        let anchor = doc.create(Some(scroller), Rect::new(0.0, 0.0, 1.0, 1.0));
        doc.detach(anchor);
        let shared: SharedDocument = doc.into_shared();

        let (_, cb) = counter();
        let obs = ViewportObserver::observe(&f.bus, &f.scheduler, &shared, anchor, cb);
        // window scroll + window resize
        assert_eq!(obs.listener_count(), 2);
    }

    #[traced_test]
    #[test]
    fn arming_is_logged() {
        let f = fixture();
        let (_, cb) = counter();
        let obs = ViewportObserver::observe(&f.bus, &f.scheduler, &f.document, f.anchor, cb);
        drop(obs);
        assert!(logs_contain("viewport observer armed"));
        assert!(logs_contain("viewport observer disarmed"));
    }
}
