#![forbid(unsafe_code)]

//! Integration tests: placement through a live overlay.

use popkit::prelude::*;
use popkit::{EventTarget, PlacementRequest, Side, compute};
use popkit_harness::strategies::{arb_anchor, arb_position, arb_size};
use popkit_harness::{Page, PageLayout};
use proptest::prelude::*;

fn menu_at(position: Placement) -> OverlayConfig {
    OverlayConfig::for_role(Role::Menu).position(position)
}

// ============================================================================
// Documented scenarios
// ============================================================================

#[test]
fn bottom_start_opens_below_trigger() {
    let page = Page::new();
    let menu = page.overlay(menu_at(Placement::BOTTOM_START));
    assert!(menu.request_open());

    let placed = menu.placement().expect("placed on open");
    assert_eq!(placed.resolved, Placement::BOTTOM_START);
    assert_eq!((placed.x, placed.y), (10.0, 48.0));
    assert!(!placed.flipped);
    assert_eq!(menu.presentation(), Presentation::Anchored);
}

#[test]
fn short_viewport_flips_above_trigger() {
    let page = Page::with_viewport(Size::new(800.0, 60.0));
    let menu = page.overlay(menu_at(Placement::BOTTOM_START));
    menu.request_open();

    let placed = menu.placement().expect("placed on open");
    assert_eq!(placed.resolved, Placement::TOP_START);
    assert!(placed.flipped);
    assert!(placed.overflowed);
    // Nothing fits, so the auto mobile behavior goes fullscreen.
    assert_eq!(menu.presentation(), Presentation::Fullscreen);
}

// ============================================================================
// Recompute triggers
// ============================================================================

#[test]
fn scrolling_recomputes_on_next_frame() {
    let page = Page::new();
    let menu = page.overlay(menu_at(Placement::BOTTOM_START));
    menu.request_open();

    page.move_trigger(Rect::new(10.0, 440.0, 100.0, 30.0));
    page.scroll(EventTarget::Element(page.scroller));
    page.scroll(EventTarget::Window);
    assert_eq!(
        menu.placement().map(|p| p.resolved),
        Some(Placement::BOTTOM_START),
        "stale until the frame runs"
    );

    assert_eq!(page.run_frame(), 1);
    let placed = menu.placement().expect("recomputed");
    assert_eq!(placed.resolved, Placement::TOP_START);
    assert_eq!(placed.y, 440.0 - 8.0 - 150.0);

    let stats = menu.viewport_stats().expect("observing while open");
    assert_eq!(stats.events, 2);
    assert_eq!(stats.recomputes, 1);
}

#[test]
fn resize_below_breakpoint_goes_fullscreen() {
    let page = Page::new();
    let menu = page.overlay(menu_at(Placement::BOTTOM_START));
    menu.request_open();
    assert_eq!(menu.presentation(), Presentation::Anchored);

    page.resize(Size::new(500.0, 600.0));
    page.run_frame();
    assert!(menu.presentation().is_fullscreen());

    page.resize(Size::new(1024.0, 600.0));
    page.run_frame();
    assert_eq!(menu.presentation(), Presentation::Anchored);
}

#[test]
fn overlay_mobile_behavior_stays_anchored() {
    let page = Page::with_viewport(Size::new(375.0, 667.0));
    let menu = page.overlay(
        menu_at(Placement::BOTTOM_START).mobile_behavior(MobileBehavior::Overlay),
    );
    menu.request_open();
    assert_eq!(menu.presentation(), Presentation::Anchored);
}

#[test]
fn unmeasurable_content_uses_configured_size() {
    let page = Page::with_layout(PageLayout {
        panel: Size::new(0.0, 0.0),
        items: 0,
        ..PageLayout::default()
    });
    let menu = page.overlay(
        menu_at(Placement::BOTTOM_START).overlay_size(Size::new(200.0, 600.0)),
    );
    menu.request_open();
    let placed = menu.placement().expect("anchor is measurable");
    // 600px tall never fits below or above; the fallback still clamps.
    assert!(placed.overflowed);
    assert_ne!(placed.resolved.side, Side::Bottom);
}

#[test]
fn detached_trigger_keeps_last_placement() {
    let page = Page::new();
    let menu = page.overlay(menu_at(Placement::BOTTOM_START));
    menu.request_open();
    let before = menu.placement();

    page.detach(page.trigger);
    assert_eq!(menu.reposition(), None);
    assert_eq!(menu.placement(), before);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn placement_never_leaves_viewport_when_it_fits(
        anchor in arb_anchor(Size::new(800.0, 600.0)),
        size in arb_size(Size::new(784.0, 584.0)),
        position in arb_position(),
    ) {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        let request = PlacementRequest::new(anchor, viewport).preferred(position);
        let placed = compute(&request, size);
        let bounds = viewport.inset(request.margin);
        prop_assert!(bounds.contains_rect(&placed.rect(size)), "{placed:?}");
        if position == Position::Auto {
            prop_assert!(!placed.flipped);
        }
    }

    #[test]
    fn resolved_position_round_trips_through_text(position in arb_position()) {
        let text = position.to_string();
        prop_assert_eq!(text.parse::<Position>(), Ok(position));
    }
}
