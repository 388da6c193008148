#![forbid(unsafe_code)]

//! Change-tracking and disposal primitives.
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII disposer; releases its registration exactly once.
//! - [`Binding`]: a derived read-only view of an observable.
//! - [`BindingScope`]: owns a group of subscriptions for one lifetime.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Subscriptions hold a `Weak` back-reference, so releasing a
//! subscription after its observable is gone is a no-op.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. A released subscription is never called again, even mid-notification.

pub mod binding;
pub mod observable;

pub use binding::{Binding, BindingScope, bind_mapped};
pub use observable::{Observable, Subscription};
