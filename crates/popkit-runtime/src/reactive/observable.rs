#![forbid(unsafe_code)]

//! Version-tracked observable values and RAII subscriptions.
//!
//! [`Subscription`] doubles as the engine's universal *disposer*: every
//! armed listener (observable callback, event-bus handler, queued frame
//! callback) is represented by one, and releasing it runs the teardown
//! exactly once, whether through [`Subscription::dispose`] or `Drop`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// RAII guard for a registered callback or listener.
///
/// The release action runs at most once. Dropping the guard releases it.
#[must_use = "dropping a Subscription immediately releases it"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a teardown action.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release.
    pub fn empty() -> Self {
        Self { release: None }
    }

    /// Whether the release action has not yet run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Release now. Equivalent to dropping, but reads better at call sites
    /// that tear down on a state transition.
    pub fn dispose(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Observable<T>
// ---------------------------------------------------------------------------

type Callback<T> = Rc<dyn Fn(&T)>;

struct Subscriber<T> {
    id: u64,
    alive: Rc<Cell<bool>>,
    callback: Callback<T>,
}

struct Inner<T> {
    value: T,
    version: u64,
    next_id: u64,
    subscribers: Vec<Subscriber<T>>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Cloning an `Observable` clones the handle, not the value.
///
/// # Invariants
///
/// 1. The version increments exactly once per `set` that changes the value.
/// 2. Subscribers run in registration order, after the value is stored and
///    with no internal borrow held, so they may read or even `set` again.
/// 3. A subscriber released during a notification is not called for the
///    remainder of that notification.
pub struct Observable<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                version: 0,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Current value (cloned).
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Number of changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Store `value` and notify subscribers if it differs from the current
    /// value. Returns whether a change happened.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value.clone();
            inner.version += 1;
        }
        self.notify(&value);
        true
    }

    /// Register `callback` for future changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let alive = Rc::new(Cell::new(true));
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                alive: Rc::clone(&alive),
                callback: Rc::new(callback),
            });
            id
        };

        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            alive.set(false);
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|s| s.id != id);
            }
        })
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self, value: &T) {
        let snapshot: Vec<(Rc<Cell<bool>>, Callback<T>)> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .map(|s| (Rc::clone(&s.alive), Rc::clone(&s.callback)))
            .collect();
        for (alive, callback) in snapshot {
            if alive.get() {
                callback(value);
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}
