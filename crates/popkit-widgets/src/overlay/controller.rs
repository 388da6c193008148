#![forbid(unsafe_code)]

//! Overlay lifecycle.
//!
//! [`OverlayController`] owns one overlay's state machine
//!
//! ```text
//! Closed ──request_open──▶ Opening ──armed──▶ Open
//!    ▲                                         │
//!    └──── finish_close ◀── Closing ◀──request_close / dismiss
//! ```
//!
//! and, while open, one *cycle* of armed resources: the viewport observer,
//! the focus trap and the dismiss listeners. Opening arms a fresh cycle;
//! closing disarms it completely before the close hooks run.
//!
//! # Invariants
//!
//! 1. At most one cycle is armed, and only in `Open`.
//! 2. `request_open` is a no-op in `Opening`/`Open`; `request_close` is a
//!    no-op everywhere but `Open`. Two dismissals in one tick therefore
//!    produce exactly one `on_close`.
//! 3. State, placement and presentation are readable only; the controller
//!    is their sole writer.
//! 4. User callbacks (hooks and observable subscribers) run with no
//!    internal borrow held and may call back into the controller.
//! 5. Overlays sharing an [`OverlayEnv`] share one dismiss layer stack:
//!    Escape reaches only the newest open overlay, and closing an overlay
//!    first closes every open overlay anchored inside its content.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Anchor unmeasurable | Detached or zero-sized | Placement kept, recompute skipped |
//! | Content unmeasurable | Not rendered yet | `overlay_size` from the config is used |
//! | Trigger detached before close | Unmounted | Focus not restored |
//! | Controller dropped while open | Owner dropped | Cycle released, no hooks fire |
//! | Closed from an open observer | Re-entrant `request_close` | `on_open` skipped |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use popkit_core::document::{ElementId, SharedDocument};
use popkit_runtime::{
    Binding, EventBus, FrameScheduler, Observable, ObserverStats, Subscription,
    ViewportObservation, ViewportObserver, bind_mapped,
};

use super::aria::{apply_anchor_attributes, apply_content_attributes};
use super::config::{ConfigError, OverlayConfig};
use super::dismiss::{
    DismissController, DismissGuard, DismissLayers, DismissOptions, DismissReason,
};
use super::focus_trap::{FocusContext, FocusTrap};
use super::placement::{ComputedPlacement, PlacementRequest, compute};
use super::presentation::{Presentation, resolve_presentation};

/// Lifecycle state of an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlayState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl OverlayState {
    /// Logically open: the `isOpen` flag a component reflects.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, OverlayState::Opening | OverlayState::Open)
    }

    /// Content should be rendered (includes a deferred close).
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, OverlayState::Closed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OverlayState::Closed => "closed",
            OverlayState::Opening => "opening",
            OverlayState::Open => "open",
            OverlayState::Closing => "closing",
        }
    }
}

impl fmt::Display for OverlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host services an overlay runs against.
#[derive(Clone)]
pub struct OverlayEnv {
    pub document: SharedDocument,
    pub bus: EventBus,
    pub scheduler: FrameScheduler,
    /// Dismiss guards of every open overlay in this environment.
    pub layers: DismissLayers,
}

impl OverlayEnv {
    #[must_use]
    pub fn new(document: SharedDocument, bus: EventBus, scheduler: FrameScheduler) -> Self {
        Self {
            document,
            bus,
            scheduler,
            layers: DismissLayers::new(),
        }
    }

    /// Fresh event bus and frame scheduler around `document`.
    #[must_use]
    pub fn with_document(document: SharedDocument) -> Self {
        Self::new(document, EventBus::new(), FrameScheduler::new())
    }
}

impl fmt::Debug for OverlayEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayEnv")
            .field("bus", &self.bus)
            .field("scheduler", &self.scheduler)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

/// Callbacks registered through `on_open`/`on_close`.
struct Hooks<F: ?Sized> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Rc<F>)>>,
}

impl<F: ?Sized + 'static> Hooks<F> {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        })
    }

    fn add(self: &Rc<Self>, hook: Rc<F>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, hook));
        let weak: Weak<Self> = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(hooks) = weak.upgrade() {
                hooks.entries.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }

    fn snapshot(&self) -> Vec<Rc<F>> {
        self.entries.borrow().iter().map(|(_, h)| Rc::clone(h)).collect()
    }
}

/// Resources armed for one open cycle.
struct OpenCycle {
    dismiss: DismissGuard,
    viewport: ViewportObservation,
    focus: Option<FocusContext>,
}

struct Shared {
    env: OverlayEnv,
    anchor: ElementId,
    content: ElementId,
    config: RefCell<OverlayConfig>,
    initial_focus: Cell<Option<ElementId>>,
    state: Observable<OverlayState>,
    placement: Observable<Option<ComputedPlacement>>,
    presentation: Observable<Presentation>,
    cycle: RefCell<Option<OpenCycle>>,
    last_close: Cell<Option<DismissReason>>,
    open_hooks: Rc<Hooks<dyn Fn()>>,
    close_hooks: Rc<Hooks<dyn Fn(DismissReason)>>,
}

/// Handle to one overlay. Clones share the same overlay.
#[derive(Clone)]
pub struct OverlayController {
    shared: Rc<Shared>,
}

impl OverlayController {
    /// Create a closed overlay for `content`, anchored at `anchor`.
    ///
    /// The configuration is used as given; out-of-range values are
    /// sanitized during placement. Use [`try_new`](Self::try_new) to
    /// reject them instead.
    pub fn new(
        env: &OverlayEnv,
        anchor: ElementId,
        content: ElementId,
        config: OverlayConfig,
    ) -> Self {
        {
            let mut doc = env.document.borrow_mut();
            apply_content_attributes(&mut *doc, content, config.role, &config.aria_labels());
            apply_anchor_attributes(&mut *doc, anchor, content, config.role, false);
        }
        Self {
            shared: Rc::new(Shared {
                env: env.clone(),
                anchor,
                content,
                config: RefCell::new(config),
                initial_focus: Cell::new(None),
                state: Observable::new(OverlayState::Closed),
                placement: Observable::new(None),
                presentation: Observable::new(Presentation::Anchored),
                cycle: RefCell::new(None),
                last_close: Cell::new(None),
                open_hooks: Hooks::new(),
                close_hooks: Hooks::new(),
            }),
        }
    }

    /// Like [`new`](Self::new), but validates the configuration first.
    pub fn try_new(
        env: &OverlayEnv,
        anchor: ElementId,
        content: ElementId,
        config: OverlayConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(env, anchor, content, config))
    }

    #[must_use]
    pub fn anchor(&self) -> ElementId {
        self.shared.anchor
    }

    #[must_use]
    pub fn content(&self) -> ElementId {
        self.shared.content
    }

    #[must_use]
    pub fn config(&self) -> OverlayConfig {
        self.shared.config.borrow().clone()
    }

    /// Replace the configuration.
    ///
    /// ARIA attributes are refreshed immediately and an open overlay is
    /// repositioned. Listener options take effect from the next open.
    pub fn set_config(&self, config: OverlayConfig) {
        let open = self.state().is_open();
        {
            let mut doc = self.shared.env.document.borrow_mut();
            let (anchor, content) = (self.shared.anchor, self.shared.content);
            apply_content_attributes(&mut *doc, content, config.role, &config.aria_labels());
            apply_anchor_attributes(&mut *doc, anchor, content, config.role, open);
        }
        *self.shared.config.borrow_mut() = config;
        if open {
            self.recompute();
        }
    }

    /// Element to focus on open instead of the first focusable item.
    pub fn set_initial_focus(&self, target: Option<ElementId>) {
        self.shared.initial_focus.set(target);
    }

    #[must_use]
    pub fn state(&self) -> OverlayState {
        self.shared.state.get()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Last computed placement. Retained across closes.
    #[must_use]
    pub fn placement(&self) -> Option<ComputedPlacement> {
        self.shared.placement.get()
    }

    #[must_use]
    pub fn presentation(&self) -> Presentation {
        self.shared.presentation.get()
    }

    /// Reason passed to the most recent `on_close`.
    #[must_use]
    pub fn last_close_reason(&self) -> Option<DismissReason> {
        self.shared.last_close.get()
    }

    /// Live `is_open` view for two-way bindings in consuming components.
    #[must_use]
    pub fn is_open_binding(&self) -> Binding<bool> {
        bind_mapped(&self.shared.state, |s| s.is_open())
    }

    pub fn on_state_change(&self, callback: impl Fn(&OverlayState) + 'static) -> Subscription {
        self.shared.state.subscribe(callback)
    }

    pub fn on_placement_change(
        &self,
        callback: impl Fn(&Option<ComputedPlacement>) + 'static,
    ) -> Subscription {
        self.shared.placement.subscribe(callback)
    }

    pub fn on_presentation_change(
        &self,
        callback: impl Fn(&Presentation) + 'static,
    ) -> Subscription {
        self.shared.presentation.subscribe(callback)
    }

    /// Run `callback` every time the overlay finishes opening.
    pub fn on_open(&self, callback: impl Fn() + 'static) -> Subscription {
        self.shared.open_hooks.add(Rc::new(callback))
    }

    /// Run `callback` with the reason every time the overlay closes.
    pub fn on_close(&self, callback: impl Fn(DismissReason) + 'static) -> Subscription {
        self.shared.close_hooks.add(Rc::new(callback))
    }

    /// Scroll/resize statistics for the current open cycle.
    #[must_use]
    pub fn viewport_stats(&self) -> Option<ObserverStats> {
        self.shared
            .cycle
            .borrow()
            .as_ref()
            .map(|cycle| cycle.viewport.stats())
    }

    /// Whether both handles refer to the same overlay.
    #[must_use]
    pub fn ptr_eq(&self, other: &OverlayController) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Open the overlay. Returns `false` if it was already opening or open.
    ///
    /// A deferred close still in progress is finished first.
    pub fn request_open(&self) -> bool {
        match self.state() {
            OverlayState::Opening | OverlayState::Open => return false,
            OverlayState::Closing => {
                self.finish_close();
            }
            OverlayState::Closed => {}
        }

        self.transition(OverlayState::Opening);
        self.recompute();
        let cycle = self.arm();
        *self.shared.cycle.borrow_mut() = Some(cycle);
        self.reflect_open(true);
        self.transition(OverlayState::Open);

        // A state subscriber may already have closed it again.
        if self.state() == OverlayState::Open {
            for hook in self.shared.open_hooks.snapshot() {
                hook();
            }
        }
        true
    }

    /// Close the overlay. Returns `false` unless it was open.
    pub fn request_close(&self, reason: DismissReason) -> bool {
        if self.state() != OverlayState::Open {
            return false;
        }
        let (restore_focus, defer_close) = {
            let config = self.shared.config.borrow();
            (config.restore_focus, config.defer_close)
        };

        self.transition(OverlayState::Closing);
        let env = &self.shared.env;
        env.layers.dismiss_within(&env.document, self.shared.content, reason);
        let cycle = self.shared.cycle.borrow_mut().take();
        if let Some(cycle) = cycle {
            cycle.dismiss.disarm();
            cycle.viewport.dispose();
            if let Some(focus) = cycle.focus {
                FocusTrap::deactivate(focus, restore_focus);
            }
        }
        self.reflect_open(false);
        self.shared.last_close.set(Some(reason));

        #[cfg(feature = "tracing")]
        tracing::debug!(%reason, cancel = reason.is_cancel(), "overlay closing");

        for hook in self.shared.close_hooks.snapshot() {
            hook(reason);
        }
        if !defer_close {
            self.finish_close();
        }
        true
    }

    /// Complete a deferred close. Returns `false` unless in `Closing`.
    pub fn finish_close(&self) -> bool {
        if self.state() != OverlayState::Closing {
            return false;
        }
        self.transition(OverlayState::Closed);
        true
    }

    /// Map the external `isOpen` flag onto open/close requests.
    pub fn set_open(&self, open: bool) -> bool {
        if open {
            self.request_open()
        } else {
            self.request_close(DismissReason::ProgrammaticClose)
        }
    }

    /// Recompute placement now, e.g. after the content changed size.
    ///
    /// Returns `None` when closed or when the anchor cannot be measured.
    pub fn reposition(&self) -> Option<ComputedPlacement> {
        if !self.state().is_open() {
            return None;
        }
        self.recompute()
    }

    fn transition(&self, next: OverlayState) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            from = %self.state(),
            to = %next,
            content = %self.shared.content,
            "overlay state"
        );
        self.shared.state.set(next);
    }

    fn reflect_open(&self, open: bool) {
        let role = self.shared.config.borrow().role;
        let mut doc = self.shared.env.document.borrow_mut();
        apply_anchor_attributes(&mut *doc, self.shared.anchor, self.shared.content, role, open);
    }

    fn recompute(&self) -> Option<ComputedPlacement> {
        let shared = &self.shared;
        let measured = {
            let doc = shared.env.document.borrow();
            doc.measurable_rect(shared.anchor).map(|anchor| {
                let content = doc.measurable_rect(shared.content).map(|r| r.size());
                (anchor, doc.viewport(), content)
            })
        };
        let Some((anchor, viewport, content_size)) = measured else {
            #[cfg(feature = "tracing")]
            tracing::debug!(anchor = %shared.anchor, "anchor not measurable, keeping placement");
            return None;
        };

        let (request, size, behavior) = {
            let config = shared.config.borrow();
            let request = PlacementRequest::new(anchor, viewport)
                .preferred(config.position)
                .margin(config.margin)
                .allow_repositioning(config.allow_repositioning);
            (request, content_size.unwrap_or(config.overlay_size), config.mobile_behavior)
        };
        let computed = compute(&request, size);
        let presentation = resolve_presentation(viewport.width, behavior, computed.overflowed);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            resolved = %computed.resolved,
            x = computed.x,
            y = computed.y,
            flipped = computed.flipped,
            overflowed = computed.overflowed,
            ?presentation,
            "overlay placed"
        );

        shared.placement.set(Some(computed));
        shared.presentation.set(presentation);
        Some(computed)
    }

    fn arm(&self) -> OpenCycle {
        let shared = &self.shared;
        let env = &shared.env;
        let config = shared.config.borrow().clone();

        let weak = Rc::downgrade(shared);
        let viewport = ViewportObserver::observe(
            &env.bus,
            &env.scheduler,
            &env.document,
            shared.anchor,
            move || {
                if let Some(shared) = weak.upgrade() {
                    OverlayController { shared }.recompute();
                }
            },
        );

        // A trap that cannot be left by Tab-out has to wrap.
        let wraps = config.wrap_focus || !config.close_on_tab_out;
        let focus = config.focus_trap.then(|| {
            FocusTrap::activate(
                &env.document,
                &env.bus,
                shared.content,
                shared.initial_focus.get(),
                wraps,
            )
        });

        let options = DismissOptions {
            close_on_escape: config.close_on_escape,
            close_on_outside_click: config.close_if_click_outside,
            close_on_tab_out: config.close_on_tab_out,
            trap_wraps: config.focus_trap && wraps,
        };
        let weak = Rc::downgrade(shared);
        let dismiss = DismissController::arm_layered(
            &env.layers,
            &env.bus,
            &env.document,
            shared.content,
            shared.anchor,
            options,
            move |reason| {
                if let Some(shared) = weak.upgrade() {
                    OverlayController { shared }.request_close(reason);
                }
            },
        );

        OpenCycle {
            dismiss,
            viewport,
            focus,
        }
    }
}

impl fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayController")
            .field("anchor", &self.shared.anchor)
            .field("content", &self.shared.content)
            .field("state", &self.state())
            .field("placement", &self.placement())
            .finish()
    }
}
