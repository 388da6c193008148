#![forbid(unsafe_code)]

//! Anchored overlays: popups, menus, listboxes, date pickers, tooltips.
//!
//! The pieces compose bottom-up:
//!
//! - [`placement`]: pure side/alignment resolution with flip and clamp.
//! - [`focus_trap`]: focus capture, Tab wrapping and restoration.
//! - [`dismiss`]: Escape, outside pointer and Tab-out detection.
//! - [`presentation`]: anchored vs. fullscreen on small viewports.
//! - [`aria`]: popup semantics on the anchor and content.
//! - [`config`]: per-overlay options with role-dependent defaults.
//! - [`controller`]: the lifecycle state machine tying the above together.
//! - [`stack`]: LIFO bookkeeping for nested overlays.
//!
//! # Example
//!
//! ```ignore
//! let env = OverlayEnv::with_document(document);
//! let menu = OverlayController::new(
//!     &env,
//!     trigger,
//!     panel,
//!     OverlayConfig::for_role(Role::Menu).position(Placement::BOTTOM_START),
//! );
//! let _closed = menu.on_close(|reason| println!("closed: {reason}"));
//!
//! menu.request_open();
//! // host forwards input and runs frames
//! env.bus.dispatch(&event);
//! env.scheduler.run_frame();
//! ```

pub mod aria;
pub mod config;
pub mod controller;
pub mod dismiss;
pub mod focus_trap;
pub mod placement;
pub mod presentation;
pub mod stack;

pub use aria::{AriaLabels, Role};
pub use config::{ConfigError, OverlayConfig};
pub use controller::{OverlayController, OverlayEnv, OverlayState};
pub use dismiss::{
    DismissController, DismissGuard, DismissLayers, DismissOptions, DismissReason,
};
pub use focus_trap::{FocusContext, FocusTrap};
pub use placement::{
    Align, ComputedPlacement, DEFAULT_MARGIN, ParsePositionError, Placement, PlacementRequest,
    Position, compute,
};
pub use presentation::{MOBILE_BREAKPOINT, MobileBehavior, Presentation, resolve_presentation};
pub use stack::OverlayStack;
