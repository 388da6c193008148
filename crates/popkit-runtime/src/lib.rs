#![forbid(unsafe_code)]

//! Runtime plumbing for popkit overlays.
//!
//! Everything here is single-threaded and built on `Rc`/`RefCell`:
//!
//! - [`reactive`]: observables and the [`Subscription`] disposer.
//! - [`event_bus`]: the injectable source of window/document/element events.
//! - [`frame`]: per-animation-frame callback scheduling.
//! - [`viewport`]: scroll/resize observation coalesced to one recompute per
//!   frame.

pub mod event_bus;
pub mod frame;
pub mod reactive;
pub mod viewport;

pub use event_bus::{EventBus, ListenOptions};
pub use frame::FrameScheduler;
pub use reactive::{Binding, BindingScope, Observable, Subscription, bind_mapped};
pub use viewport::{ObserverStats, ViewportObservation, ViewportObserver};
