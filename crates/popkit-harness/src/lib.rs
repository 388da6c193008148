#![forbid(unsafe_code)]

//! Reference fixtures for popkit integration tests.
//!
//! [`Page`] is a small in-memory page: a trigger inside a scroll container,
//! an overlay panel with a few focusable items, and a focusable element
//! after the trigger. Helpers dispatch input the way a browser host would,
//! including the default Tab behavior when no listener prevents it.

use std::cell::RefCell;
use std::rc::Rc;

use popkit::prelude::*;
use popkit::{
    EventFlow, EventTarget, KeyCode, KeyEvent, MemoryDocument, Modifiers, Point, PointerEvent,
};

/// Layout knobs for [`Page`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub viewport: Size,
    pub trigger: Rect,
    pub panel: Size,
    pub items: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            viewport: Size::new(800.0, 600.0),
            trigger: Rect::new(10.0, 10.0, 100.0, 30.0),
            panel: Size::new(200.0, 150.0),
            items: 3,
        }
    }
}

/// An in-memory page hosting one trigger and its overlay panel.
pub struct Page {
    pub doc: Rc<RefCell<MemoryDocument>>,
    pub env: OverlayEnv,
    pub scroller: ElementId,
    pub trigger: ElementId,
    pub panel: ElementId,
    pub items: Vec<ElementId>,
    /// Focusable element that follows the trigger in Tab order.
    pub after: ElementId,
}

impl Page {
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(PageLayout::default())
    }

    #[must_use]
    pub fn with_viewport(viewport: Size) -> Self {
        Self::with_layout(PageLayout {
            viewport,
            ..PageLayout::default()
        })
    }

    #[must_use]
    pub fn with_layout(layout: PageLayout) -> Self {
        let mut d = MemoryDocument::new(layout.viewport);
        let scroller = d.create(None, Rect::from_size(layout.viewport));
        d.set_scrollable(scroller, true);
        let trigger = d.create_focusable(Some(scroller), layout.trigger);
        let after = d.create_focusable(
            Some(scroller),
            Rect::new(layout.trigger.x, layout.trigger.bottom() + 200.0, 80.0, 24.0),
        );
        let panel = d.create(None, Rect::from_size(layout.panel));
        let items = (0..layout.items)
            .map(|i| {
                let y = 4.0 + 28.0 * i as f64;
                d.create_focusable(Some(panel), Rect::new(4.0, y, layout.panel.width - 8.0, 24.0))
            })
            .collect();
        d.focus(trigger);

        let doc = d.into_shared();
        let shared: SharedDocument = doc.clone();
        tracing::debug!(?layout, "page fixture built");
        Self {
            doc,
            env: OverlayEnv::with_document(shared),
            scroller,
            trigger,
            panel,
            items,
            after,
        }
    }

    /// An overlay for this page's trigger and panel.
    #[must_use]
    pub fn overlay(&self, config: OverlayConfig) -> OverlayController {
        OverlayController::new(&self.env, self.trigger, self.panel, config)
    }

    pub fn press(&self, code: KeyCode) -> EventFlow {
        self.env.bus.dispatch(&Event::Key(KeyEvent::press(code)))
    }

    /// Press Tab (or Shift+Tab) and apply the host default unless a
    /// listener prevented it. Returns the newly focused element.
    pub fn tab(&self, forward: bool) -> Option<ElementId> {
        let mut key = KeyEvent::press(KeyCode::Tab);
        if !forward {
            key = key.with_modifiers(Modifiers::SHIFT);
        }
        if !self.env.bus.dispatch(&Event::Key(key)).is_prevented() {
            self.doc.borrow_mut().tab(forward);
        }
        self.active()
    }

    /// Pointer-down on `target` at its center.
    pub fn click(&self, target: ElementId) -> EventFlow {
        let at = self
            .doc
            .borrow()
            .client_rect(target)
            .map_or(Point::default(), |r| Point::new(r.center_x(), r.center_y()));
        self.env
            .bus
            .dispatch(&Event::Pointer(PointerEvent::down(at, Some(target))))
    }

    /// Pointer-down on the bare page background at `at`.
    pub fn click_at(&self, at: Point) -> EventFlow {
        self.env.bus.dispatch(&Event::Pointer(PointerEvent::down(at, None)))
    }

    pub fn scroll(&self, target: EventTarget) {
        self.env.bus.dispatch(&Event::Scroll(target));
    }

    pub fn resize(&self, size: Size) {
        self.doc.borrow_mut().set_viewport(size);
        self.env.bus.dispatch(&Event::Resize(size));
    }

    pub fn run_frame(&self) -> usize {
        self.env.scheduler.run_frame()
    }

    pub fn move_trigger(&self, rect: Rect) {
        self.doc.borrow_mut().set_rect(self.trigger, rect);
    }

    pub fn detach(&self, id: ElementId) {
        self.doc.borrow_mut().detach(id);
    }

    #[must_use]
    pub fn active(&self) -> Option<ElementId> {
        self.doc.borrow().active_element()
    }

    #[must_use]
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.doc.borrow().attribute(id, name).map(str::to_owned)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.env.bus.listener_count()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an overlay configuration the way a consuming component would load
/// it from its JSON defaults.
pub fn config_from_json(json: &str) -> Result<OverlayConfig, serde_json::Error> {
    serde_json::from_str(json)
}

/// Records every close reason an overlay reports.
pub fn record_closes(
    overlay: &OverlayController,
) -> (Rc<RefCell<Vec<DismissReason>>>, Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = overlay.on_close(move |reason| sink.borrow_mut().push(reason));
    (log, sub)
}

/// Proptest strategies for placement inputs.
pub mod strategies {
    use popkit::{Align, Placement, Position, Rect, Side, Size};
    use proptest::prelude::*;

    /// Integer-valued rects keep float arithmetic exact.
    pub fn arb_anchor(viewport: Size) -> impl Strategy<Value = Rect> {
        let max_x = viewport.width as i32;
        let max_y = viewport.height as i32;
        (0..max_x, 0..max_y, 1i32..160, 1i32..64).prop_map(|(x, y, w, h)| {
            Rect::new(f64::from(x), f64::from(y), f64::from(w), f64::from(h))
        })
    }

    pub fn arb_size(max: Size) -> impl Strategy<Value = Size> {
        (0..=max.width as i32, 0..=max.height as i32)
            .prop_map(|(w, h)| Size::new(f64::from(w), f64::from(h)))
    }

    pub fn arb_placement() -> impl Strategy<Value = Placement> {
        (0usize..4, 0usize..3).prop_map(|(s, a)| Placement::new(Side::ALL[s], Align::ALL[a]))
    }

    pub fn arb_position() -> impl Strategy<Value = Position> {
        prop_oneof![
            1 => Just(Position::Auto),
            4 => arb_placement().prop_map(Position::At),
        ]
    }
}
