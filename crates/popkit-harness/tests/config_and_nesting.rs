#![forbid(unsafe_code)]

//! Integration tests: JSON-loaded configuration and nested overlays.

use popkit::prelude::*;
use popkit::{ConfigError, KeyCode, MemoryDocument};
use popkit_harness::{Page, config_from_json};

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn json_config_drives_placement() {
    let config = config_from_json(
        r#"{ "position": "bottom-start", "margin": 8, "role": "listbox", "aria-label": "Fruit" }"#,
    )
    .expect("valid config");
    assert_eq!(config.role, Role::Listbox);

    let page = Page::new();
    let listbox = page.overlay(config);
    listbox.request_open();
    let placed = listbox.placement().expect("placed");
    assert_eq!((placed.x, placed.y), (10.0, 48.0));
    assert_eq!(page.attribute(page.panel, "aria-label").as_deref(), Some("Fruit"));
}

#[test]
fn json_rejects_unknown_position() {
    let err = config_from_json(r#"{ "position": "middle" }"#).unwrap_err();
    assert!(err.to_string().contains("middle"), "{err}");
}

#[test]
fn config_serializes_back_to_kebab_case() {
    let config = OverlayConfig::for_role(Role::Dialog).position(Placement::TOP);
    let json = serde_json::to_value(&config).expect("serializable");
    assert_eq!(json["position"], "top");
    assert_eq!(json["role"], "dialog");
    assert_eq!(json["close-on-escape"], true);
    assert_eq!(config_from_json(&json.to_string()).ok(), Some(config));
}

#[test]
fn try_new_rejects_invalid_margin() {
    let page = Page::new();
    let result = OverlayController::try_new(
        &page.env,
        page.trigger,
        page.panel,
        OverlayConfig::default().margin(f64::NAN),
    );
    assert!(matches!(result, Err(ConfigError::InvalidMargin(_))));
}

// ============================================================================
// Nesting
// ============================================================================

struct Nested {
    env: OverlayEnv,
    outer: OverlayController,
    inner: OverlayController,
}

fn nested() -> Nested {
    let mut d = MemoryDocument::new(Size::new(1024.0, 768.0));
    let trigger = d.create_focusable(None, Rect::new(10.0, 10.0, 100.0, 30.0));
    let menu = d.create(None, Rect::new(10.0, 48.0, 200.0, 150.0));
    let submenu_trigger = d.create_focusable(Some(menu), Rect::new(14.0, 52.0, 192.0, 24.0));
    let submenu = d.create(None, Rect::new(218.0, 52.0, 160.0, 100.0));
    d.create_focusable(Some(submenu), Rect::new(222.0, 56.0, 152.0, 24.0));
    d.focus(trigger);
    let shared: SharedDocument = d.into_shared();
    let env = OverlayEnv::with_document(shared);

    let outer = OverlayController::new(&env, trigger, menu, OverlayConfig::for_role(Role::Menu));
    let inner = OverlayController::new(
        &env,
        submenu_trigger,
        submenu,
        OverlayConfig::for_role(Role::Menu).position(Placement::RIGHT_START),
    );
    Nested { env, outer, inner }
}

#[test]
fn escape_closes_innermost_first() {
    let n = nested();
    let mut stack = OverlayStack::new();
    stack.open(&n.outer);
    stack.open(&n.inner);
    assert_eq!(stack.depth(), 2);

    let escape = Event::Key(popkit::KeyEvent::press(KeyCode::Escape));
    assert!(n.env.bus.dispatch(&escape).is_prevented());
    assert!(n.outer.is_open());
    assert!(!n.inner.is_open());
    assert_eq!(n.inner.last_close_reason(), Some(DismissReason::Escape));
    assert_eq!(stack.depth(), 1);

    n.env.bus.dispatch(&escape);
    assert!(!n.outer.is_open());
    assert!(stack.is_empty());
    assert_eq!(n.env.bus.listener_count(), 0);
}

#[test]
fn stack_close_top_closes_innermost() {
    let n = nested();
    let mut stack = OverlayStack::new();
    stack.open(&n.outer);
    stack.open(&n.inner);
    stack.close_top(DismissReason::ProgrammaticClose);
    assert!(n.outer.is_open());
    assert!(!n.inner.is_open());
    assert_eq!(stack.depth(), 1);
}

#[test]
fn closing_parent_closes_child() {
    let n = nested();
    let (closes, _sub) = popkit_harness::record_closes(&n.inner);
    n.outer.request_open();
    n.inner.request_open();

    n.outer.request_close(DismissReason::ProgrammaticClose);
    assert!(!n.inner.is_open());
    assert_eq!(*closes.borrow(), vec![DismissReason::ProgrammaticClose]);
    assert_eq!(n.env.bus.listener_count(), 0);
}

#[test]
fn dialog_with_listbox_inside_unwinds_on_escape() {
    let page = Page::new();
    let (listbox_panel, option) = {
        let mut doc = page.doc.borrow_mut();
        let listbox_panel = doc.create(Some(page.panel), Rect::new(0.0, 0.0, 180.0, 80.0));
        let option = doc.create_focusable(Some(listbox_panel), Rect::new(4.0, 4.0, 172.0, 24.0));
        (listbox_panel, option)
    };
    let dialog = page.overlay(OverlayConfig::for_role(Role::Dialog));
    let listbox = OverlayController::new(
        &page.env,
        page.items[0],
        listbox_panel,
        OverlayConfig::for_role(Role::Listbox),
    );
    dialog.request_open();
    listbox.request_open();
    assert_eq!(page.active(), Some(page.items[0]));

    // Clicking an option inside the listbox dismisses neither overlay.
    page.click(option);
    assert!(dialog.is_open() && listbox.is_open());

    page.press(KeyCode::Escape);
    assert!(dialog.is_open());
    assert!(!listbox.is_open());
    assert_eq!(page.active(), Some(page.items[0]));

    page.press(KeyCode::Escape);
    assert!(!dialog.is_open());
    assert_eq!(page.listener_count(), 0);
    assert_eq!(page.active(), Some(page.trigger));
}

#[test]
fn clicking_inside_parent_closes_only_child() {
    let n = nested();
    let mut stack = OverlayStack::new();
    stack.open(&n.outer);
    stack.open(&n.inner);

    let inside_outer = Event::Pointer(popkit::PointerEvent::down(
        popkit::Point::new(100.0, 120.0),
        Some(n.outer.content()),
    ));
    n.env.bus.dispatch(&inside_outer);

    assert!(n.outer.is_open());
    assert!(!n.inner.is_open());
    assert!(stack.top().is_some_and(|top| top.ptr_eq(&n.outer)));
}

#[test]
fn close_all_unwinds_innermost_first() {
    let n = nested();
    let mut stack = OverlayStack::new();
    stack.open(&n.outer);
    stack.open(&n.inner);
    assert_eq!(stack.close_all(DismissReason::ProgrammaticClose), 2);
    assert!(stack.is_empty());
    assert_eq!(n.env.bus.listener_count(), 0);
}
