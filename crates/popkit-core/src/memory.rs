#![forbid(unsafe_code)]

//! In-memory host document.
//!
//! [`MemoryDocument`] is a small element tree with rects, focus, scroll
//! containers and attributes. It implements [`Document`] so overlays can be
//! exercised without a browser. It also simulates the host's default Tab
//! behavior ([`MemoryDocument::tab`]) so focus-trap tests can observe what
//! happens when a listener does *not* prevent the default.
//!
//! Available in this crate's tests and, for downstream crates, behind the
//! `test-helpers` feature.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::document::{Document, ElementId};
use crate::geometry::{Rect, Size};

#[derive(Debug, Clone, Default)]
struct Node {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    rect: Rect,
    focusable: bool,
    programmatic_focus: bool,
    scrollable: bool,
    attributes: AHashMap<String, String>,
}

/// An element tree living entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: AHashMap<ElementId, Node>,
    root: ElementId,
    viewport: Rect,
    active: Option<ElementId>,
    next_id: u64,
}

impl MemoryDocument {
    /// Create a document whose viewport starts at the origin.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        let root = ElementId::new(0);
        let mut nodes = AHashMap::new();
        nodes.insert(
            root,
            Node {
                rect: Rect::from_size(viewport),
                ..Node::default()
            },
        );
        Self {
            nodes,
            root,
            viewport: Rect::from_size(viewport),
            active: None,
            next_id: 1,
        }
    }

    /// Wrap in the shared handle the overlay engine expects.
    #[must_use]
    pub fn into_shared(self) -> Rc<RefCell<MemoryDocument>> {
        Rc::new(RefCell::new(self))
    }

    /// The `<body>`-like root every attached element descends from.
    #[inline]
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Append a new element under `parent` (the root when `None`).
    pub fn create(&mut self, parent: Option<ElementId>, rect: Rect) -> ElementId {
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        let parent = parent.unwrap_or(self.root);
        self.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                rect,
                ..Node::default()
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Append a Tab-focusable element (a button, an input).
    pub fn create_focusable(&mut self, parent: Option<ElementId>, rect: Rect) -> ElementId {
        let id = self.create(parent, rect);
        self.set_focusable(id, true);
        id
    }

    pub fn set_focusable(&mut self, id: ElementId, focusable: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.focusable = focusable;
        }
    }

    pub fn set_scrollable(&mut self, id: ElementId, scrollable: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.scrollable = scrollable;
        }
    }

    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.rect = rect;
        }
    }

    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = Rect::from_size(size);
        let root = self.root;
        self.set_rect(root, self.viewport);
    }

    /// Remove `id` (and its subtree) from the tree.
    ///
    /// The nodes stay in memory so stale ids remain queryable, but they are
    /// no longer attached. Focus inside the removed subtree is dropped.
    pub fn detach(&mut self, id: ElementId) {
        if id == self.root {
            return;
        }
        let parent = self.nodes.get_mut(&id).and_then(|n| n.parent.take());
        if let Some(parent) = parent
            && let Some(p) = self.nodes.get_mut(&parent)
        {
            p.children.retain(|c| *c != id);
        }
        if let Some(active) = self.active
            && self.is_in_subtree(id, active)
        {
            self.active = None;
        }
    }

    /// Read an attribute previously set through [`Document::set_attribute`].
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    /// Simulate the host's default Tab handling: move focus to the next (or
    /// previous) Tab-focusable element in document order, wrapping at the
    /// ends.
    pub fn tab(&mut self, forward: bool) -> Option<ElementId> {
        let order = self.focusable_descendants(self.root);
        if order.is_empty() {
            return None;
        }
        let idx = self
            .active
            .and_then(|a| order.iter().position(|e| *e == a));
        let next = match (idx, forward) {
            (None, true) => 0,
            (None, false) => order.len() - 1,
            (Some(i), true) => (i + 1) % order.len(),
            (Some(i), false) => (i + order.len() - 1) % order.len(),
        };
        self.active = Some(order[next]);
        self.active
    }

    /// Whether `node` is `ancestor` or below it, ignoring attachment.
    fn is_in_subtree(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    fn preorder(&self, root: ElementId, out: &mut Vec<ElementId>) {
        if let Some(node) = self.nodes.get(&root) {
            for child in &node.children {
                out.push(*child);
                self.preorder(*child, out);
            }
        }
    }
}

impl Document for MemoryDocument {
    fn viewport(&self) -> Rect {
        self.viewport
    }

    fn is_attached(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id) && self.is_in_subtree(self.root, id)
    }

    fn client_rect(&self, id: ElementId) -> Option<Rect> {
        self.nodes.get(&id).map(|n| n.rect)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        self.nodes.contains_key(&node) && self.is_in_subtree(ancestor, node)
    }

    fn focusable_descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut all = Vec::new();
        self.preorder(root, &mut all);
        all.retain(|id| self.nodes.get(id).is_some_and(|n| n.focusable));
        all
    }

    fn scrollable_ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cursor = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else {
                break;
            };
            if node.scrollable {
                out.push(current);
            }
            cursor = node.parent;
        }
        out
    }

    fn active_element(&self) -> Option<ElementId> {
        self.active
    }

    fn focus(&mut self, id: ElementId) -> bool {
        if !self.is_attached(id) {
            return false;
        }
        let can_focus = self
            .nodes
            .get(&id)
            .is_some_and(|n| n.focusable || n.programmatic_focus);
        if can_focus {
            self.active = Some(id);
        }
        can_focus
    }

    fn make_programmatically_focusable(&mut self, id: ElementId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.programmatic_focus = true;
        }
    }

    fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&mut self, id: ElementId, name: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.attributes.remove(name);
        }
    }
}
