#![forbid(unsafe_code)]

//! Overlay configuration.
//!
//! [`OverlayConfig`] collects every knob a consuming component (popup,
//! popup menu, combobox, date picker) passes to the
//! [`OverlayController`](super::OverlayController). Defaults depend on the
//! [`Role`]: menus and dialogs trap focus, menus close when Tab leaves the
//! last item, dialogs wrap Tab instead.
//!
//! With the `serde` feature the struct loads from JSON/TOML using kebab-case
//! keys; missing keys take their defaults.

use std::fmt;

use popkit_core::geometry::Size;

use super::aria::{AriaLabels, Role};
use super::placement::{DEFAULT_MARGIN, Position};
use super::presentation::MobileBehavior;

/// Configuration for one overlay.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct OverlayConfig {
    pub position: Position,
    /// Gap to the anchor and inset from the viewport edges, in px.
    pub margin: f64,
    pub allow_repositioning: bool,
    pub focus_trap: bool,
    /// Tab wraps inside the trap instead of leaving the overlay.
    pub wrap_focus: bool,
    pub restore_focus: bool,
    pub close_if_click_outside: bool,
    pub close_on_escape: bool,
    pub close_on_tab_out: bool,
    pub mobile_behavior: MobileBehavior,
    pub role: Role,
    pub aria_label: Option<String>,
    pub aria_labelledby: Option<String>,
    pub aria_describedby: Option<String>,
    /// Stay in `Closing` until `finish_close()` (exit animations).
    pub defer_close: bool,
    /// Size used for placement while the content cannot be measured.
    pub overlay_size: Size,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::for_role(Role::default())
    }
}

impl OverlayConfig {
    /// Defaults for `role`.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        Self {
            position: Position::Auto,
            margin: DEFAULT_MARGIN,
            allow_repositioning: true,
            focus_trap: matches!(role, Role::Menu | Role::Dialog),
            wrap_focus: matches!(role, Role::Dialog),
            restore_focus: true,
            close_if_click_outside: true,
            close_on_escape: true,
            close_on_tab_out: matches!(role, Role::Menu),
            mobile_behavior: MobileBehavior::Auto,
            role,
            aria_label: None,
            aria_labelledby: None,
            aria_describedby: None,
            defer_close: false,
            overlay_size: Size::default(),
        }
    }

    #[must_use]
    pub fn position(mut self, position: impl Into<Position>) -> Self {
        self.position = position.into();
        self
    }

    #[must_use]
    pub fn margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub fn allow_repositioning(mut self, allow: bool) -> Self {
        self.allow_repositioning = allow;
        self
    }

    #[must_use]
    pub fn focus_trap(mut self, trap: bool) -> Self {
        self.focus_trap = trap;
        self
    }

    #[must_use]
    pub fn wrap_focus(mut self, wrap: bool) -> Self {
        self.wrap_focus = wrap;
        self
    }

    #[must_use]
    pub fn restore_focus(mut self, restore: bool) -> Self {
        self.restore_focus = restore;
        self
    }

    #[must_use]
    pub fn close_if_click_outside(mut self, close: bool) -> Self {
        self.close_if_click_outside = close;
        self
    }

    #[must_use]
    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = close;
        self
    }

    #[must_use]
    pub fn close_on_tab_out(mut self, close: bool) -> Self {
        self.close_on_tab_out = close;
        self
    }

    #[must_use]
    pub fn mobile_behavior(mut self, behavior: MobileBehavior) -> Self {
        self.mobile_behavior = behavior;
        self
    }

    #[must_use]
    pub fn aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn aria_labelledby(mut self, id: impl Into<String>) -> Self {
        self.aria_labelledby = Some(id.into());
        self
    }

    #[must_use]
    pub fn aria_describedby(mut self, id: impl Into<String>) -> Self {
        self.aria_describedby = Some(id.into());
        self
    }

    #[must_use]
    pub fn defer_close(mut self, defer: bool) -> Self {
        self.defer_close = defer;
        self
    }

    #[must_use]
    pub fn overlay_size(mut self, size: Size) -> Self {
        self.overlay_size = size;
        self
    }

    /// Labels to stamp on the content root.
    #[must_use]
    pub fn aria_labels(&self) -> AriaLabels {
        AriaLabels {
            label: self.aria_label.clone(),
            labelledby: self.aria_labelledby.clone(),
            describedby: self.aria_describedby.clone(),
        }
    }

    /// Check values that cannot be expressed in the type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(ConfigError::InvalidMargin(self.margin));
        }
        if !self.overlay_size.is_valid() {
            return Err(ConfigError::InvalidOverlaySize(self.overlay_size));
        }
        for (field, value) in [
            ("aria-label", &self.aria_label),
            ("aria-labelledby", &self.aria_labelledby),
            ("aria-describedby", &self.aria_describedby),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::EmptyAriaValue(field));
            }
        }
        Ok(())
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Margin is negative, NaN or infinite.
    InvalidMargin(f64),
    /// Fallback overlay size has a negative or non-finite dimension.
    InvalidOverlaySize(Size),
    /// An ARIA passthrough is set but blank.
    EmptyAriaValue(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMargin(m) => {
                write!(f, "margin must be a finite, non-negative length, got {m}")
            }
            Self::InvalidOverlaySize(s) => write!(
                f,
                "overlay size must be finite and non-negative, got {}x{}",
                s.width, s.height
            ),
            Self::EmptyAriaValue(field) => write!(f, "{field} is set but empty"),
        }
    }
}

impl std::error::Error for ConfigError {}
