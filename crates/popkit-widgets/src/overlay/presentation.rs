#![forbid(unsafe_code)]

//! Anchored vs. fullscreen presentation on small viewports.

/// Viewports narrower than this are treated as mobile.
pub const MOBILE_BREAKPOINT: f64 = 768.0;

/// How an overlay should present on small screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MobileBehavior {
    /// Fullscreen below [`MOBILE_BREAKPOINT`] or when placement overflowed.
    #[default]
    Auto,
    Fullscreen,
    /// Always anchored, even on phones.
    Overlay,
}

/// Resolved presentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presentation {
    #[default]
    Anchored,
    Fullscreen,
}

impl Presentation {
    #[must_use]
    pub const fn is_fullscreen(self) -> bool {
        matches!(self, Presentation::Fullscreen)
    }
}

#[must_use]
pub fn resolve_presentation(
    viewport_width: f64,
    behavior: MobileBehavior,
    overflowed: bool,
) -> Presentation {
    match behavior {
        MobileBehavior::Fullscreen => Presentation::Fullscreen,
        MobileBehavior::Overlay => Presentation::Anchored,
        MobileBehavior::Auto if viewport_width < MOBILE_BREAKPOINT || overflowed => {
            Presentation::Fullscreen
        }
        MobileBehavior::Auto => Presentation::Anchored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_modes_ignore_viewport() {
        for width in [320.0, 1024.0] {
            for overflowed in [false, true] {
                assert_eq!(
                    resolve_presentation(width, MobileBehavior::Fullscreen, overflowed),
                    Presentation::Fullscreen
                );
                assert_eq!(
                    resolve_presentation(width, MobileBehavior::Overlay, overflowed),
                    Presentation::Anchored
                );
            }
        }
    }

    #[test]
    fn auto_switches_at_breakpoint() {
        assert!(resolve_presentation(767.0, MobileBehavior::Auto, false).is_fullscreen());
        assert!(!resolve_presentation(768.0, MobileBehavior::Auto, false).is_fullscreen());
        assert!(!resolve_presentation(1280.0, MobileBehavior::Auto, false).is_fullscreen());
    }

    #[test]
    fn auto_goes_fullscreen_on_overflow() {
        assert!(resolve_presentation(1280.0, MobileBehavior::Auto, true).is_fullscreen());
    }
}
