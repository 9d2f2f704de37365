//! Focus hand-off between editor instances.
//!
//! When a tooltip is dismissed by a click that lands on a link belonging
//! to some editor surface (possibly a different one), the dismissing side
//! publishes the link here and the owning instance re-runs its visibility
//! check. Instances subscribe on attach and leave on detach.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wasm_bindgen::JsCast;

struct EditorEntry {
    id: usize,
    root: web_sys::Element,
    notify: Rc<dyn Fn()>,
}

thread_local! {
    // Roots are DOM handles and stay on the one wasm thread.
    static EDITORS: RefCell<Vec<EditorEntry>> = RefCell::new(Vec::new());
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

pub(crate) fn register(root: web_sys::Element, notify: Rc<dyn Fn()>) -> usize {
    let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
    EDITORS.with(|editors| {
        editors.borrow_mut().push(EditorEntry { id, root, notify });
    });
    id
}

pub(crate) fn unregister(id: usize) {
    EDITORS.with(|editors| {
        editors.borrow_mut().retain(|e| e.id != id);
    });
}

/// Notifies the instance whose surface contains `target`.
/// Returns whether any instance claimed it.
pub(crate) fn notify_link_focus(target: &web_sys::Element) -> bool {
    let notify = EDITORS.with(|editors| {
        editors
            .borrow()
            .iter()
            .find(|e| e.root.contains(Some(target.as_ref())))
            .map(|e| Rc::clone(&e.notify))
    });

    match notify {
        Some(notify) => {
            notify();
            true
        }
        None => false,
    }
}

/// Deferred variant: runs after the current event finishes bubbling and
/// the dismissing tooltip has torn down. Targets that left the tree in
/// the meantime are dropped.
pub(crate) fn notify_link_focus_deferred(target: web_sys::Element) {
    let Some(win) = web_sys::window() else {
        return;
    };

    let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
        if target.is_connected() {
            notify_link_focus(&target);
        }
    });

    let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 0);
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture(html: &str) -> web_sys::Element {
        let d = web_sys::window().unwrap().document().unwrap();
        let host = d.create_element("div").unwrap();
        host.set_inner_html(html);
        d.body().unwrap().append_child(&host).unwrap();
        host
    }

    #[wasm_bindgen_test]
    fn test_notified_instance_is_the_one_containing_the_target() {
        let ours = fixture("<p><a href=\"https://x.test\">inside</a></p>");
        let other = fixture("<p><a href=\"https://x.test\">elsewhere</a></p>");

        let hits = Rc::new(Cell::new(0));
        let hits2 = Rc::clone(&hits);
        let id = register(ours.clone(), Rc::new(move || hits2.set(hits2.get() + 1)));

        let inside = ours.query_selector("a").unwrap().unwrap();
        let elsewhere = other.query_selector("a").unwrap().unwrap();

        assert!(notify_link_focus(&inside));
        assert_eq!(hits.get(), 1);

        assert!(!notify_link_focus(&elsewhere));
        assert_eq!(hits.get(), 1);

        unregister(id);
        ours.remove();
        other.remove();
    }

    #[wasm_bindgen_test]
    fn test_unregistered_instances_are_never_notified() {
        let host = fixture("<p><a href=\"https://x.test\">inside</a></p>");

        let hits = Rc::new(Cell::new(0));
        let hits2 = Rc::clone(&hits);
        let id = register(host.clone(), Rc::new(move || hits2.set(hits2.get() + 1)));
        unregister(id);

        let link = host.query_selector("a").unwrap().unwrap();
        assert!(!notify_link_focus(&link));
        assert_eq!(hits.get(), 0);

        // Unregistering twice is harmless.
        unregister(id);
        host.remove();
    }
}
