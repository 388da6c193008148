#![forbid(unsafe_code)]

//! Dismissal detection.
//!
//! While armed, a [`DismissGuard`] listens for the three user gestures that
//! close an overlay: Escape, a pointer-down outside both the overlay and its
//! anchor, and Tab off the end of a non-wrapping overlay. The first gesture
//! that fires wins; later ones in the same guard are ignored.
//!
//! Guards armed through one [`DismissLayers`] form a stack. Escape belongs
//! to the most recently armed guard only, so nested overlays unwind one
//! level per key press, and an overlay that closes takes down the overlays
//! anchored inside it ([`DismissLayers::dismiss_within`]).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use popkit_core::document::{ElementId, SharedDocument};
use popkit_core::event::{Event, EventFlow, EventKind, EventTarget, KeyCode, PointerEvent};
use popkit_runtime::{BindingScope, EventBus, ListenOptions, Subscription};

/// Why an overlay closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DismissReason {
    Escape,
    OutsidePointer,
    TabOut,
    /// `request_close`/`set_open(false)` from the owning component.
    ProgrammaticClose,
}

impl DismissReason {
    /// The user cancelled, as opposed to the component closing it.
    #[must_use]
    pub const fn is_cancel(self) -> bool {
        !matches!(self, DismissReason::ProgrammaticClose)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DismissReason::Escape => "escape",
            DismissReason::OutsidePointer => "outside-pointer",
            DismissReason::TabOut => "tab-out",
            DismissReason::ProgrammaticClose => "programmatic-close",
        }
    }
}

impl fmt::Display for DismissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which gestures dismiss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissOptions {
    pub close_on_escape: bool,
    pub close_on_outside_click: bool,
    pub close_on_tab_out: bool,
    /// The overlay's focus trap wraps Tab; Tab-out can never happen.
    pub trap_wraps: bool,
}

impl Default for DismissOptions {
    fn default() -> Self {
        Self {
            close_on_escape: true,
            close_on_outside_click: true,
            close_on_tab_out: false,
            trap_wraps: false,
        }
    }
}

type Fire = Rc<dyn Fn(DismissReason)>;

struct Layer {
    id: u64,
    anchor: ElementId,
    fire: Fire,
}

#[derive(Default)]
struct LayerList {
    next_id: u64,
    layers: Vec<Layer>,
}

/// Stack of armed guards shared by every overlay in one environment,
/// oldest first.
#[derive(Clone, Default)]
pub struct DismissLayers {
    inner: Rc<RefCell<LayerList>>,
}

impl DismissLayers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed guards.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.borrow().layers.len()
    }

    /// Dismiss every armed guard whose anchor lies inside `root`, newest
    /// first. Returns how many were dismissed.
    pub fn dismiss_within(
        &self,
        document: &SharedDocument,
        root: ElementId,
        reason: DismissReason,
    ) -> usize {
        let nested: Vec<Fire> = {
            let doc = document.borrow();
            self.inner
                .borrow()
                .layers
                .iter()
                .rev()
                .filter(|layer| doc.contains(root, layer.anchor))
                .map(|layer| Rc::clone(&layer.fire))
                .collect()
        };
        for fire in &nested {
            fire(reason);
        }
        nested.len()
    }

    fn push(&self, anchor: ElementId, fire: &Fire) -> (u64, Subscription) {
        let id = {
            let mut list = self.inner.borrow_mut();
            let id = list.next_id;
            list.next_id += 1;
            list.layers.push(Layer {
                id,
                anchor,
                fire: Rc::clone(fire),
            });
            id
        };
        let weak = Rc::downgrade(&self.inner);
        let release = Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().layers.retain(|layer| layer.id != id);
            }
        });
        (id, release)
    }

    fn is_top(&self, id: u64) -> bool {
        self.inner.borrow().layers.last().is_some_and(|layer| layer.id == id)
    }
}

impl fmt::Debug for DismissLayers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DismissLayers")
            .field("depth", &self.depth())
            .finish()
    }
}

/// Armed dismissal listeners. Dropping the guard disarms them.
pub struct DismissGuard {
    scope: BindingScope,
    fired: Rc<Cell<Option<DismissReason>>>,
    _layer: Subscription,
}

impl DismissGuard {
    /// The reason that fired, if any.
    #[must_use]
    pub fn fired(&self) -> Option<DismissReason> {
        self.fired.get()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.scope.binding_count()
    }

    pub fn disarm(self) {}
}

impl fmt::Debug for DismissGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DismissGuard")
            .field("listeners", &self.listener_count())
            .field("fired", &self.fired())
            .finish()
    }
}

/// Arms dismissal listeners.
pub struct DismissController;

impl DismissController {
    /// Start listening on behalf of the overlay rooted at `trap_root` and
    /// anchored at `anchor`. `on_dismiss` runs at most once per guard.
    ///
    /// The guard is the only layer, so it always owns Escape.
    pub fn arm(
        bus: &EventBus,
        document: &SharedDocument,
        trap_root: ElementId,
        anchor: ElementId,
        options: DismissOptions,
        on_dismiss: impl Fn(DismissReason) + 'static,
    ) -> DismissGuard {
        let layers = DismissLayers::new();
        Self::arm_layered(&layers, bus, document, trap_root, anchor, options, on_dismiss)
    }

    /// Like [`arm`](Self::arm), pushing the guard on top of `layers`.
    ///
    /// Escape is handled only while this guard is the top layer; when the
    /// top layer does not close on Escape, nothing does.
    pub fn arm_layered(
        layers: &DismissLayers,
        bus: &EventBus,
        document: &SharedDocument,
        trap_root: ElementId,
        anchor: ElementId,
        options: DismissOptions,
        on_dismiss: impl Fn(DismissReason) + 'static,
    ) -> DismissGuard {
        let fired = Rc::new(Cell::new(None));
        let fire: Fire = {
            let fired = Rc::clone(&fired);
            Rc::new(move |reason| {
                if fired.get().is_some() {
                    return;
                }
                fired.set(Some(reason));
                #[cfg(feature = "tracing")]
                tracing::debug!(%reason, "dismiss");
                on_dismiss(reason);
            })
        };

        let tab_out = options.close_on_tab_out && !options.trap_wraps;
        let (layer, layer_release) = layers.push(anchor, &fire);
        let mut scope = BindingScope::new();

        if options.close_on_escape || tab_out {
            let fire = Rc::clone(&fire);
            let doc = Rc::clone(document);
            let layers = layers.clone();
            scope.hold(bus.listen(
                EventTarget::Document,
                EventKind::KeyDown,
                ListenOptions::default(),
                move |event| {
                    let Event::Key(key) = event else {
                        return EventFlow::Continue;
                    };
                    if options.close_on_escape && key.is_press() && key.code == KeyCode::Escape {
                        if !layers.is_top(layer) {
                            return EventFlow::Continue;
                        }
                        fire(DismissReason::Escape);
                        return EventFlow::Prevent;
                    }
                    if tab_out && key.is_tab_forward() && focus_on_last(&doc, trap_root) {
                        // Focus moves on to whatever follows the overlay.
                        fire(DismissReason::TabOut);
                    }
                    EventFlow::Continue
                },
            ));
        }

        if options.close_on_outside_click {
            let fire = Rc::clone(&fire);
            let doc = Rc::clone(document);
            scope.hold(bus.listen(
                EventTarget::Document,
                EventKind::PointerDown,
                ListenOptions::default(),
                move |event| {
                    if let Event::Pointer(pointer) = event
                        && is_outside(&doc, trap_root, anchor, pointer)
                    {
                        fire(DismissReason::OutsidePointer);
                    }
                    EventFlow::Continue
                },
            ));
        }

        DismissGuard {
            scope,
            fired,
            _layer: layer_release,
        }
    }
}

fn focus_on_last(document: &SharedDocument, trap_root: ElementId) -> bool {
    let doc = document.borrow();
    let last = doc.focusable_descendants(trap_root).last().copied();
    last.is_some() && doc.active_element() == last
}

/// A pointer-down hit neither the overlay nor its anchor.
///
/// Hosts that could not hit-test the pointer report no target; the
/// position is then checked against both rects.
fn is_outside(
    document: &SharedDocument,
    trap_root: ElementId,
    anchor: ElementId,
    pointer: &PointerEvent,
) -> bool {
    let doc = document.borrow();
    match pointer.target {
        Some(target) => !doc.contains(trap_root, target) && !doc.contains(anchor, target),
        None => [trap_root, anchor].into_iter().all(|id| {
            doc.measurable_rect(id)
                .is_none_or(|rect| !rect.contains_point(pointer.position))
        }),
    }
}
