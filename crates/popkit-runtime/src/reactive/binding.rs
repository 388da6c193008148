#![forbid(unsafe_code)]

//! Derived read bindings and scoped subscription ownership.
//!
//! A [`Binding<T>`] reads an [`Observable`] through a projection; the
//! overlay controller hands one out for its open flag so components can
//! reflect `isOpen` without keeping their own copy of the state.
//!
//! A [`BindingScope`] owns the [`Subscription`]s of one logical lifetime,
//! such as the listeners armed for one open cycle. Clearing or dropping
//! the scope releases every member.
//!
//! # Invariants
//!
//! 1. `Binding::get()` reads through to the source; it never caches.
//! 2. Members are released newest first, on drop and on `clear()`.
//! 3. After `clear()` the scope is empty and reusable.

use std::fmt;
use std::rc::Rc;

use super::observable::{Observable, Subscription};

/// Read-only projection of an observable, evaluated on each `get()`.
pub struct Binding<T> {
    eval: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            eval: Rc::clone(&self.eval),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.get()).finish()
    }
}

impl<T: 'static> Binding<T> {
    #[must_use]
    pub fn get(&self) -> T {
        (self.eval)()
    }
}

/// `source` projected through `map`.
pub fn bind_mapped<S: Clone + PartialEq + 'static, T: 'static>(
    source: &Observable<S>,
    map: impl Fn(&S) -> T + 'static,
) -> Binding<T> {
    let source = source.clone();
    Binding {
        eval: Rc::new(move || source.with(&map)),
    }
}

/// Owns a set of subscriptions for one logical lifetime.
#[derive(Default)]
pub struct BindingScope {
    members: Vec<Subscription>,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `sub` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, sub: Subscription) {
        self.members.push(sub);
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Release everything now, newest first.
    pub fn clear(&mut self) {
        while let Some(sub) = self.members.pop() {
            sub.dispose();
        }
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("members", &self.members.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Phase {
        Closed,
        Open,
        Closing,
    }

    #[test]
    fn mapped_binding_reads_through() {
        let phase = Observable::new(Phase::Closed);
        let is_open = bind_mapped(&phase, |p| *p == Phase::Open);
        let copy = is_open.clone();
        assert!(!is_open.get());

        phase.set(Phase::Open);
        assert!(is_open.get());
        assert!(copy.get());

        phase.set(Phase::Closing);
        assert!(!is_open.get());
        assert_eq!(format!("{is_open:?}"), "Binding(false)");
    }

    #[test]
    fn scope_drop_releases_members() {
        let phase = Observable::new(Phase::Closed);
        let seen = Rc::new(Cell::new(0));
        {
            let mut scope = BindingScope::new();
            let s = Rc::clone(&seen);
            scope.hold(phase.subscribe(move |_| s.set(s.get() + 1)));
            phase.set(Phase::Open);
        }
        phase.set(Phase::Closed);
        assert_eq!(seen.get(), 1);
        assert_eq!(phase.subscriber_count(), 0);
    }

    #[test]
    fn clear_releases_newest_first_and_scope_is_reusable() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut scope = BindingScope::new();
        for i in 0..3 {
            let o = Rc::clone(&order);
            scope.hold(Subscription::new(move || o.borrow_mut().push(i)));
        }
        assert_eq!(scope.binding_count(), 3);

        scope.clear();
        assert!(scope.is_empty());
        assert_eq!(*order.borrow(), vec![2, 1, 0]);

        let o = Rc::clone(&order);
        scope.hold(Subscription::new(move || o.borrow_mut().push(9)));
        drop(scope);
        assert_eq!(*order.borrow(), vec![2, 1, 0, 9]);
        assert_eq!(format!("{:?}", BindingScope::new()), "BindingScope { members: 0 }");
    }
}
