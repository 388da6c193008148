#![forbid(unsafe_code)]

//! Host input events delivered to overlay listeners.
//!
//! These types model the subset of browser-style events the overlay engine
//! reacts to: key presses (Escape, Tab), pointer-down for outside clicks,
//! scroll on the window or an ancestor, and window resize. Hosts translate
//! their native events into [`Event`] and hand them to the runtime's event
//! bus.

use bitflags::bitflags;

use crate::document::ElementId;
use crate::geometry::{Point, Size};

bitflags! {
    /// Keyboard modifier state at the time of the event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Tab,
    Enter,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Char(char),
}

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Release,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press with no modifiers.
    #[must_use]
    pub const fn press(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[inline]
    pub fn is_press(&self) -> bool {
        self.kind == KeyEventKind::Press
    }

    #[inline]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Tab press without Shift.
    pub fn is_tab_forward(&self) -> bool {
        self.is_press() && self.code == KeyCode::Tab && !self.shift()
    }

    /// Shift+Tab press.
    pub fn is_tab_backward(&self) -> bool {
        self.is_press() && self.code == KeyCode::Tab && self.shift()
    }
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// Pointer event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Down(PointerButton),
    Up(PointerButton),
    Move,
}

/// A pointer event with its hit-test target.
///
/// `target` is the innermost element under the pointer, or `None` when the
/// pointer landed on no element the host knows about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Point,
    pub target: Option<ElementId>,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(kind: PointerEventKind, position: Point, target: Option<ElementId>) -> Self {
        Self {
            kind,
            position,
            target,
        }
    }

    /// Primary-button pointer-down on `target`.
    #[must_use]
    pub const fn down(position: Point, target: Option<ElementId>) -> Self {
        Self::new(
            PointerEventKind::Down(PointerButton::Primary),
            position,
            target,
        )
    }

    #[inline]
    pub fn is_down(&self) -> bool {
        matches!(self.kind, PointerEventKind::Down(_))
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Document,
    Element(ElementId),
}

/// Listener category, used as the registration key on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    PointerDown,
    Scroll,
    Resize,
}

/// An input event from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Pointer(PointerEvent),
    /// The given target scrolled.
    Scroll(EventTarget),
    /// The window was resized to the new inner size.
    Resize(Size),
}

impl Event {
    /// Listener category for this event, if any listener could care.
    ///
    /// Key releases and pointer moves/ups map to `None`; the engine never
    /// listens for them.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Event::Key(k) if k.is_press() => Some(EventKind::KeyDown),
            Event::Key(_) => None,
            Event::Pointer(p) if p.is_down() => Some(EventKind::PointerDown),
            Event::Pointer(_) => None,
            Event::Scroll(_) => Some(EventKind::Scroll),
            Event::Resize(_) => Some(EventKind::Resize),
        }
    }

    /// Target the event is dispatched at.
    ///
    /// Keyboard and pointer events are delivered at the document, resize at
    /// the window, and scroll at whatever scrolled.
    pub fn target(&self) -> EventTarget {
        match self {
            Event::Key(_) | Event::Pointer(_) => EventTarget::Document,
            Event::Scroll(target) => *target,
            Event::Resize(_) => EventTarget::Window,
        }
    }
}

/// What a listener asks the dispatcher to do after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFlow {
    /// Let the host apply its default behavior.
    #[default]
    Continue,
    /// Prevent the host default (e.g. moving focus on Tab) and stop
    /// propagation to later listeners.
    Prevent,
}

impl EventFlow {
    #[inline]
    pub fn is_prevented(self) -> bool {
        self == EventFlow::Prevent
    }
}
