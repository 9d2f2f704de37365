//! Thin adapter over the native selection.
//!
//! Captured fresh per interaction; nothing here outlives an event handler.

use crate::editor::anchor::is_link_element;
use wasm_bindgen::JsCast;

pub(crate) struct EditorSelection {
    selection: web_sys::Selection,
    range: Option<web_sys::Range>,
}

impl EditorSelection {
    pub fn capture() -> Option<Self> {
        let selection = web_sys::window()?.get_selection().ok().flatten()?;
        let range = (selection.range_count() > 0)
            .then(|| selection.get_range_at(0).ok())
            .flatten();
        Some(Self { selection, range })
    }

    pub fn range(&self) -> Option<&web_sys::Range> {
        self.range.as_ref()
    }

    pub fn is_collapsed(&self) -> bool {
        self.selection.is_collapsed()
    }

    /// Nearest enclosing link of the caret; the selection is left alone.
    pub fn enclosing_link(&self) -> Option<web_sys::Element> {
        let node = self.selection.anchor_node()?;
        ancestor_link(&node)
    }

    /// Widening lookup: finds the enclosing link of a collapsed caret and
    /// installs a range spanning the whole node, so later edits hit the
    /// link rather than the caret position.
    ///
    /// IMPORTANT: the native selection moves when a link is found. A
    /// non-collapsed selection never counts as "inside a link" here and
    /// returns `None` untouched.
    pub fn locate_enclosing_link(&mut self) -> Option<web_sys::Element> {
        if !self.is_collapsed() {
            return None;
        }
        let link = self.enclosing_link()?;
        self.select_node(&link);
        Some(link)
    }

    /// Replaces the native selection with a range spanning `el` exactly.
    pub fn select_node(&mut self, el: &web_sys::Element) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Ok(range) = document.create_range() else {
            return;
        };
        if range.select_node(el).is_err() {
            return;
        }
        let _ = self.selection.remove_all_ranges();
        let _ = self.selection.add_range(&range);
        self.range = Some(range);
    }

    pub fn collapse_to_end(&self) {
        let _ = self.selection.collapse_to_end();
    }
}

/// Self-or-ancestor walk for a link element, up to the document root.
pub(crate) fn ancestor_link(node: &web_sys::Node) -> Option<web_sys::Element> {
    let mut el = node
        .dyn_ref::<web_sys::Element>()
        .cloned()
        .or_else(|| node.parent_element());

    while let Some(cur) = el {
        if is_link_element(&cur) {
            return Some(cur);
        }
        el = cur.parent_element();
    }
    None
}
