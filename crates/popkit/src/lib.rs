#![forbid(unsafe_code)]

//! popkit public facade.
//!
//! Re-exports the core primitives, runtime plumbing and overlay widgets,
//! plus a [`prelude`] for the common case:
//!
//! ```ignore
//! use popkit::prelude::*;
//!
//! let env = OverlayEnv::with_document(document);
//! let popup = OverlayController::new(&env, trigger, panel, OverlayConfig::for_role(Role::Dialog));
//! popup.request_open();
//! ```

pub use popkit_core as primitives;
pub use popkit_runtime as runtime;
pub use popkit_widgets as widgets;

pub use popkit_core::{
    Document, ElementId, Event, EventFlow, EventKind, EventTarget, KeyCode, KeyEvent, Modifiers,
    Point, PointerEvent, Rect, SharedDocument, Side, Size,
};
pub use popkit_runtime::{EventBus, FrameScheduler, Observable, Subscription};
pub use popkit_widgets::overlay::{
    Align, ComputedPlacement, ConfigError, DismissLayers, DismissReason, MobileBehavior,
    OverlayConfig, OverlayController, OverlayEnv, OverlayStack, OverlayState, ParsePositionError,
    Placement, PlacementRequest, Position, Presentation, Role, compute,
};

#[cfg(feature = "test-helpers")]
pub use popkit_core::memory::MemoryDocument;

#[cfg(feature = "tracing-json")]
pub use popkit_core::logging::init_json_logging;

/// The types most consumers need.
pub mod prelude {
    pub use crate::{
        ComputedPlacement, DismissReason, Document, ElementId, Event, EventBus, FrameScheduler,
        MobileBehavior, OverlayConfig, OverlayController, OverlayEnv, OverlayStack, OverlayState,
        Placement, Position, Presentation, Rect, Role, SharedDocument, Size, Subscription,
    };
}
