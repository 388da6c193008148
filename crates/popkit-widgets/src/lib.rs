#![forbid(unsafe_code)]

//! Overlay widgets for popkit.

pub mod overlay;

pub use overlay::{
    ComputedPlacement, DismissReason, MobileBehavior, OverlayConfig, OverlayController, OverlayEnv,
    OverlayStack, OverlayState, Placement, Position, Presentation, Role,
};
