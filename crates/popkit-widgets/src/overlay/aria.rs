#![forbid(unsafe_code)]

//! Accessibility attributes on the anchor and the overlay content.
//!
//! The anchor advertises what it opens (`aria-haspopup`) and whether it is
//! open (`aria-expanded`). The content root carries its role and labels.
//! Tooltips have no popup semantics; instead the anchor is described by the
//! tooltip content while it is shown.

use std::fmt;

use popkit_core::document::{Document, ElementId};

pub const ATTR_ID: &str = "id";
pub const ATTR_ROLE: &str = "role";
pub const ATTR_HASPOPUP: &str = "aria-haspopup";
pub const ATTR_EXPANDED: &str = "aria-expanded";
pub const ATTR_CONTROLS: &str = "aria-controls";
pub const ATTR_LABEL: &str = "aria-label";
pub const ATTR_LABELLEDBY: &str = "aria-labelledby";
pub const ATTR_DESCRIBEDBY: &str = "aria-describedby";
pub const ATTR_MODAL: &str = "aria-modal";

/// ARIA role of the overlay content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Role {
    #[default]
    Menu,
    Dialog,
    Listbox,
    Tooltip,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Menu => "menu",
            Role::Dialog => "dialog",
            Role::Listbox => "listbox",
            Role::Tooltip => "tooltip",
        }
    }

    /// Value for the anchor's `aria-haspopup`, if the role has one.
    pub const fn haspopup(self) -> Option<&'static str> {
        match self {
            Role::Tooltip => None,
            role => Some(role.as_str()),
        }
    }

    pub const fn is_modal(self) -> bool {
        matches!(self, Role::Dialog)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accessible name and description passed through to the content root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AriaLabels {
    pub label: Option<String>,
    pub labelledby: Option<String>,
    pub describedby: Option<String>,
}

/// DOM id used to reference an overlay's content from its anchor.
#[must_use]
pub fn content_dom_id(content: ElementId) -> String {
    format!("popkit-overlay-{}", content.id())
}

fn set_or_remove(doc: &mut dyn Document, id: ElementId, name: &str, value: Option<&str>) {
    match value {
        Some(v) => doc.set_attribute(id, name, v),
        None => doc.remove_attribute(id, name),
    }
}

/// Stamp role, id and labels on the content root.
pub fn apply_content_attributes(
    doc: &mut dyn Document,
    content: ElementId,
    role: Role,
    labels: &AriaLabels,
) {
    doc.set_attribute(content, ATTR_ID, &content_dom_id(content));
    doc.set_attribute(content, ATTR_ROLE, role.as_str());
    set_or_remove(doc, content, ATTR_LABEL, labels.label.as_deref());
    set_or_remove(doc, content, ATTR_LABELLEDBY, labels.labelledby.as_deref());
    set_or_remove(doc, content, ATTR_DESCRIBEDBY, labels.describedby.as_deref());
    set_or_remove(doc, content, ATTR_MODAL, role.is_modal().then_some("true"));
}

/// Reflect the open state on the anchor.
pub fn apply_anchor_attributes(
    doc: &mut dyn Document,
    anchor: ElementId,
    content: ElementId,
    role: Role,
    open: bool,
) {
    match role.haspopup() {
        Some(kind) => {
            doc.set_attribute(anchor, ATTR_HASPOPUP, kind);
            doc.set_attribute(anchor, ATTR_EXPANDED, if open { "true" } else { "false" });
            let controls = open.then(|| content_dom_id(content));
            set_or_remove(doc, anchor, ATTR_CONTROLS, controls.as_deref());
            doc.remove_attribute(anchor, ATTR_DESCRIBEDBY);
        }
        None => {
            doc.remove_attribute(anchor, ATTR_HASPOPUP);
            doc.remove_attribute(anchor, ATTR_EXPANDED);
            doc.remove_attribute(anchor, ATTR_CONTROLS);
            let described = open.then(|| content_dom_id(content));
            set_or_remove(doc, anchor, ATTR_DESCRIBEDBY, described.as_deref());
        }
    }
}
