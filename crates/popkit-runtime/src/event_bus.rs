#![forbid(unsafe_code)]

//! Injectable event source.
//!
//! The [`EventBus`] stands in for `addEventListener` on the window, the
//! document, and individual elements. Hosts forward native events into
//! [`EventBus::dispatch`]; tests dispatch synthetic ones. Overlay components
//! register listeners with [`EventBus::listen`] and receive a
//! [`Subscription`] that removes the listener when released.
//!
//! # Invariants
//!
//! 1. Listeners for the same `(target, kind)` run in registration order.
//! 2. A listener released while a dispatch is in flight (for example by an
//!    earlier listener that closed the overlay) is not invoked afterwards.
//! 3. A non-passive listener returning [`EventFlow::Prevent`] stops the
//!    dispatch; a passive listener's return value is ignored.
//! 4. The bus holds no borrow while a listener runs, so listeners may
//!    register, release, or dispatch re-entrantly.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use popkit_core::event::{Event, EventFlow, EventKind, EventTarget};

use crate::reactive::Subscription;

type Handler = Rc<dyn Fn(&Event) -> EventFlow>;

/// Listener registration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenOptions {
    /// The listener never prevents the host default (scroll listeners).
    pub passive: bool,
}

impl ListenOptions {
    pub const PASSIVE: Self = Self { passive: true };
}

struct Entry {
    id: u64,
    passive: bool,
    alive: Rc<Cell<bool>>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    listeners: AHashMap<(EventTarget, EventKind), Vec<Entry>>,
    next_id: u64,
}

impl Registry {
    fn remove(&mut self, key: (EventTarget, EventKind), id: u64) {
        if let Some(entries) = self.listeners.get_mut(&key) {
            entries.retain(|e| e.id != id);
            if entries.is_empty() {
                self.listeners.remove(&key);
            }
        }
    }
}

/// Shared, single-threaded listener registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Registry>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind` events dispatched at `target`.
    pub fn listen(
        &self,
        target: EventTarget,
        kind: EventKind,
        options: ListenOptions,
        handler: impl Fn(&Event) -> EventFlow + 'static,
    ) -> Subscription {
        let key = (target, kind);
        let alive = Rc::new(Cell::new(true));
        let id = {
            let mut registry = self.inner.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.entry(key).or_default().push(Entry {
                id,
                passive: options.passive,
                alive: Rc::clone(&alive),
                handler: Rc::new(handler),
            });
            id
        };
        tracing::trace!(?target, ?kind, id, passive = options.passive, "listener added");

        let weak: Weak<RefCell<Registry>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            alive.set(false);
            if let Some(registry) = weak.upgrade() {
                registry.borrow_mut().remove(key, id);
                tracing::trace!(?target, ?kind, id, "listener removed");
            }
        })
    }

    /// Deliver `event` to matching listeners.
    ///
    /// Returns [`EventFlow::Prevent`] if a non-passive listener asked the
    /// host to suppress its default behavior.
    pub fn dispatch(&self, event: &Event) -> EventFlow {
        let Some(kind) = event.kind() else {
            return EventFlow::Continue;
        };
        let key = (event.target(), kind);
        let snapshot: Vec<(bool, Rc<Cell<bool>>, Handler)> =
            match self.inner.borrow().listeners.get(&key) {
                Some(entries) => entries
                    .iter()
                    .map(|e| (e.passive, Rc::clone(&e.alive), Rc::clone(&e.handler)))
                    .collect(),
                None => return EventFlow::Continue,
            };

        for (passive, alive, handler) in snapshot {
            if !alive.get() {
                continue;
            }
            let flow = handler(event);
            if flow.is_prevented() && !passive {
                return EventFlow::Prevent;
            }
        }
        EventFlow::Continue
    }

    /// Total number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.values().map(Vec::len).sum()
    }

    /// Number of listeners registered for `kind` on any target.
    #[must_use]
    pub fn listener_count_for(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|((_, k), _)| *k == kind)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
