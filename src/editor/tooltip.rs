//! The link tooltip state machine.
//!
//! One controller per editor surface, owning the floating form's state and
//! every listener behind it.
//!
//! Responsibilities:
//! - view/edit/hidden transitions and their CSS classes
//! - listener lifecycle (submit, remove, outside click, resize) with a
//!   single idempotent teardown
//! - deferred outside-click arming, cancellable on teardown
//! - invoking the mutation engine on submit/remove
//!
//! Non-responsibilities:
//! - rendering (the editor component owns the markup)
//! - draft persistence (the page autosave owns it)

use crate::editor::anchor::classify;
use crate::editor::handoff;
use crate::editor::mutation;
use crate::editor::placement::{compute_position, gather_range_rects, Rect};
use crate::editor::selection::{ancestor_link, EditorSelection};
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

pub(crate) const NAMESPACE: &str = "folio-link-tooltip";

/// Clicks within this window after showing never count as "outside": the
/// opening click is still bubbling toward the document when we show.
const ARM_OUTSIDE_CLICK_MS: i32 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum TooltipState {
    #[default]
    Hidden,
    View,
    Edit,
}

/// The DOM the controller drives, resolved once the editor mounts.
#[derive(Clone)]
pub(crate) struct TooltipElements {
    /// Positioned wrapper the tooltip is absolutely placed within.
    pub wrapper: web_sys::HtmlElement,
    /// The contenteditable surface.
    pub surface: web_sys::HtmlElement,
    /// The tooltip form itself.
    pub root: web_sys::HtmlElement,
    pub input: web_sys::HtmlInputElement,
    pub remove_btn: web_sys::HtmlElement,
}

struct ListenerSet {
    submit: wasm_bindgen::closure::Closure<dyn FnMut(web_sys::Event)>,
    remove: wasm_bindgen::closure::Closure<dyn FnMut(web_sys::Event)>,
    outside_click: wasm_bindgen::closure::Closure<dyn FnMut(web_sys::MouseEvent)>,
}

#[derive(Clone)]
pub(crate) struct LinkTooltip {
    state: RwSignal<TooltipState>,
    href: RwSignal<String>,
    placement: RwSignal<crate::editor::placement::Placement>,

    /// Last answer from [`Self::query_state`]; the toolbar's link control
    /// reads this for its active styling.
    link_active: RwSignal<bool>,

    elements: StoredValue<Option<TooltipElements>, LocalStorage>,

    /// The link the tooltip is currently about (View always, Edit when the
    /// caret sat in an existing link).
    active_link: StoredValue<Option<web_sys::Element>, LocalStorage>,

    /// Selection snapshot from show time; submit and placement work on
    /// this, not on wherever the caret moved meanwhile.
    pending_range: StoredValue<Option<web_sys::Range>, LocalStorage>,

    /// Created once on attach, attached/detached per transition.
    listeners: StoredValue<Option<ListenerSet>, LocalStorage>,

    resize_handle: StoredValue<Option<WindowListenerHandle>>,

    /// Pending outside-click arm timer.
    arm_timer: StoredValue<Option<i32>>,

    /// Bumped on every show/teardown; deferred closures compare against it
    /// and drop themselves when stale.
    generation: StoredValue<u64>,
}

impl LinkTooltip {
    pub fn new() -> Self {
        Self {
            state: RwSignal::new(TooltipState::Hidden),
            href: RwSignal::new(String::new()),
            placement: RwSignal::new(Default::default()),
            link_active: RwSignal::new(false),
            elements: StoredValue::new_local(None),
            active_link: StoredValue::new_local(None),
            pending_range: StoredValue::new_local(None),
            listeners: StoredValue::new_local(None),
            resize_handle: StoredValue::new(None),
            arm_timer: StoredValue::new(None),
            generation: StoredValue::new(0),
        }
    }

    /// Wires the controller to its DOM. The closures are built here, once;
    /// transitions only attach and detach them.
    pub fn attach(&self, els: TooltipElements) {
        self.elements.set_value(Some(els));

        let s2 = self.clone();
        let submit = wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web_sys::Event| {
            ev.prevent_default();
            s2.submit();
        }) as Box<dyn FnMut(web_sys::Event)>);

        let s3 = self.clone();
        let remove = wasm_bindgen::closure::Closure::wrap(Box::new(move |_ev: web_sys::Event| {
            s3.remove_current();
        }) as Box<dyn FnMut(web_sys::Event)>);

        let s4 = self.clone();
        let outside_click =
            wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web_sys::MouseEvent| {
                s4.handle_outside_click(ev);
            }) as Box<dyn FnMut(web_sys::MouseEvent)>);

        self.listeners.set_value(Some(ListenerSet {
            submit,
            remove,
            outside_click,
        }));
    }

    /// Full release: teardown plus dropping the closures. After this the
    /// controller is inert until attached again.
    pub fn destroy(&self) {
        self.teardown();
        self.listeners.set_value(None);
        self.elements.set_value(None);
    }

    // ----- render-facing state -----

    pub fn is_edit(&self) -> bool {
        self.state.get() == TooltipState::Edit
    }

    pub fn link_active(&self) -> bool {
        self.link_active.get()
    }

    pub fn current_href(&self) -> String {
        self.href.get()
    }

    pub fn state_attr(&self) -> String {
        self.state.get().as_ref().to_string()
    }

    pub fn root_class(&self) -> String {
        match self.state.get() {
            TooltipState::Hidden => format!("{NAMESPACE} {NAMESPACE}-hidden"),
            s => format!("{NAMESPACE} {NAMESPACE}-state-{s}"),
        }
    }

    pub fn root_style(&self) -> String {
        let p = self.placement.get();
        format!("top: {}px; left: {}px;", p.top, p.left)
    }

    // ----- commands -----

    /// The explicit edit command (toolbar button, keyboard shortcut).
    ///
    /// Jump links pass through untouched; follow links are owned by the
    /// view flow and pass through too. Everything else opens the edit
    /// surface: a widened existing link with its href, or the raw text
    /// selection with an empty one.
    pub fn execute(&self) {
        if !self.selection_in_surface() {
            return;
        }
        let Some(mut sel) = EditorSelection::capture() else {
            return;
        };

        let link = sel.locate_enclosing_link();
        if let Some(link) = &link {
            let class = classify(link);
            if !class.managed || class.annotated {
                return;
            }
        }

        let href = link
            .as_ref()
            .and_then(|l| l.get_attribute("href"))
            .unwrap_or_default();
        let range = sel.range().map(|r| r.clone_range());

        self.show(TooltipState::Edit, link, href, range);
    }

    /// The ambient visibility check, run on every selection change and on
    /// hand-off notifications. Returns whether the selection is inside a
    /// managed link (the toolbar uses this as its active state).
    pub fn query_state(&self) -> bool {
        let active = self.query_state_inner();
        self.link_active.set(active);
        active
    }

    fn query_state_inner(&self) -> bool {
        // While editing the selection lives in the tooltip's own input;
        // leave the session alone.
        if self.state.get_untracked() == TooltipState::Edit {
            return true;
        }

        if !self.selection_in_surface() {
            self.teardown();
            return false;
        }

        let link = EditorSelection::capture().and_then(|sel| sel.enclosing_link());
        let Some(link) = link else {
            self.teardown();
            return false;
        };

        let class = classify(&link);
        if !class.managed {
            // Jump links: no tooltip, not even "active".
            self.teardown();
            return false;
        }

        let editable = link
            .dyn_ref::<web_sys::HtmlElement>()
            .map(|h| h.is_content_editable())
            .unwrap_or(false);

        if class.annotated && editable {
            if self.state.get_untracked() == TooltipState::View && self.is_active_link(&link) {
                // Same link, already showing: leave the listeners alone.
                return true;
            }

            let href = link.get_attribute("href").unwrap_or_default();
            let range = EditorSelection::capture()
                .and_then(|sel| sel.range().map(|r| r.clone_range()));
            self.show(TooltipState::View, Some(link), href, range);
        } else {
            self.teardown();
        }

        true
    }

    /// Idempotent exit to Hidden: detaches every listener, cancels the
    /// pending arm, and invalidates in-flight deferrals.
    pub fn teardown(&self) {
        self.bump_generation();
        self.cancel_arm_timer();

        self.elements.with_value(|els| {
            let Some(els) = els.as_ref() else {
                return;
            };
            self.listeners.with_value(|ls| {
                if let Some(ls) = ls.as_ref() {
                    let _ = els.root.remove_event_listener_with_callback(
                        "submit",
                        ls.submit.as_ref().unchecked_ref(),
                    );
                    let _ = els.remove_btn.remove_event_listener_with_callback(
                        "click",
                        ls.remove.as_ref().unchecked_ref(),
                    );
                    if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
                        let _ = doc.remove_event_listener_with_callback(
                            "click",
                            ls.outside_click.as_ref().unchecked_ref(),
                        );
                    }
                }
            });
        });

        self.resize_handle.update_value(|h| {
            if let Some(h) = h.take() {
                h.remove();
            }
        });

        self.active_link.set_value(None);
        self.pending_range.set_value(None);
        if self.state.get_untracked() != TooltipState::Hidden {
            self.state.set(TooltipState::Hidden);
        }
    }

    // ----- internals -----

    fn show(
        &self,
        next: TooltipState,
        link: Option<web_sys::Element>,
        href: String,
        range: Option<web_sys::Range>,
    ) {
        let Some(els) = self.elements.get_value() else {
            return;
        };

        // A fresh interaction cancels whatever the previous one left
        // pending.
        self.teardown();

        self.href.set(href.clone());
        els.input.set_value(&href);
        self.active_link.set_value(link);
        self.pending_range.set_value(range);
        self.state.set(next);

        self.listeners.with_value(|ls| {
            if let Some(ls) = ls.as_ref() {
                let _ = els
                    .root
                    .add_event_listener_with_callback("submit", ls.submit.as_ref().unchecked_ref());
                let _ = els.remove_btn.add_event_listener_with_callback(
                    "click",
                    ls.remove.as_ref().unchecked_ref(),
                );
            }
        });

        let s2 = self.clone();
        let resize = window_event_listener(ev::resize, move |_ev| {
            s2.reposition();
        });
        self.resize_handle.set_value(Some(resize));

        self.arm_outside_click();
        self.reposition();

        if next == TooltipState::Edit {
            let _ = els.input.focus();
        }
    }

    fn submit(&self) {
        let Some(els) = self.elements.get_value() else {
            return;
        };
        let raw = els.input.value();
        let link = self.active_link.get_value();
        let range = self.pending_range.get_value();

        self.teardown();

        let href = mutation::sanitize_href(&raw);
        let _ = els.surface.focus();
        self.apply_mutation(range, link, &href);
    }

    fn remove_current(&self) {
        let Some(els) = self.elements.get_value() else {
            return;
        };
        let link = self.active_link.get_value();
        let range = self.pending_range.get_value();

        self.teardown();

        let _ = els.surface.focus();
        self.apply_mutation(range, link, "");
    }

    fn apply_mutation(
        &self,
        range: Option<web_sys::Range>,
        link: Option<web_sys::Element>,
        href: &str,
    ) {
        let Some(range) = range else {
            return;
        };
        let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Mutations degrade silently; a failed DOM edit leaves the
        // document as it was.
        let _ = mutation::apply_href(&doc, &range, link.as_ref(), href);

        if let Some(sel) = EditorSelection::capture() {
            sel.collapse_to_end();
        }
    }

    fn handle_outside_click(&self, ev: web_sys::MouseEvent) {
        let Some(els) = self.elements.get_value() else {
            return;
        };
        let Some(target) = ev.target().and_then(|t| t.dyn_into::<web_sys::Node>().ok()) else {
            return;
        };

        // Clicks on the tooltip or on the link it describes pass through.
        if els.root.contains(Some(&target)) {
            return;
        }
        if let Some(link) = self.active_link.get_value() {
            if link.is_same_node(Some(&target)) || link.contains(Some(&target)) {
                return;
            }
        }

        self.teardown();

        // A click landing on another editable link hands the focus off
        // once this dismissal settles.
        if let Some(link) = ancestor_link(&target) {
            let editable = link
                .dyn_ref::<web_sys::HtmlElement>()
                .map(|h| h.is_content_editable())
                .unwrap_or(false);
            if editable {
                handoff::notify_link_focus_deferred(link);
            }
        }
    }

    fn reposition(&self) {
        let Some(els) = self.elements.get_value() else {
            return;
        };
        let Some(range) = self.pending_range.get_value() else {
            return;
        };

        let rects = gather_range_rects(&range);
        let container = Rect::from(els.wrapper.get_bounding_client_rect());
        let width = els.root.get_bounding_client_rect().width();

        self.placement.set(compute_position(&rects, container, width));
    }

    fn arm_outside_click(&self) {
        let Some(win) = web_sys::window() else {
            return;
        };

        self.cancel_arm_timer();

        let gen = self.generation.get_value();
        let s2 = self.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            if s2.generation.get_value() != gen {
                // Torn down (or re-shown) since this was scheduled.
                return;
            }
            s2.arm_timer.set_value(None);
            s2.attach_outside_click();
        });

        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                ARM_OUTSIDE_CLICK_MS,
            )
            .unwrap_or(0);
        self.arm_timer.set_value(Some(tid));
    }

    fn attach_outside_click(&self) {
        let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        self.listeners.with_value(|ls| {
            if let Some(ls) = ls.as_ref() {
                let _ = doc.add_event_listener_with_callback(
                    "click",
                    ls.outside_click.as_ref().unchecked_ref(),
                );
            }
        });
    }

    fn cancel_arm_timer(&self) {
        self.arm_timer.update_value(|t| {
            if let Some(tid) = t.take() {
                if let Some(win) = web_sys::window() {
                    win.clear_timeout_with_handle(tid);
                }
            }
        });
    }

    fn bump_generation(&self) {
        self.generation.update_value(|g| *g += 1);
    }

    /// Whether the selection anchor sits inside this controller's surface.
    /// Keeps one editor from reacting to a caret in another.
    fn selection_in_surface(&self) -> bool {
        self.elements.with_value(|els| {
            let Some(els) = els.as_ref() else {
                return false;
            };
            web_sys::window()
                .and_then(|w| w.get_selection().ok().flatten())
                .and_then(|s| s.anchor_node())
                .map(|n| els.surface.contains(Some(&n)))
                .unwrap_or(false)
        })
    }

    fn is_active_link(&self, link: &web_sys::Element) -> bool {
        self.active_link.with_value(|cur| {
            cur.as_ref()
                .map(|c| c.is_same_node(Some(link.as_ref())))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_labels_feed_the_css_classes() {
        assert_eq!(TooltipState::View.to_string(), "view");
        assert_eq!(TooltipState::Edit.to_string(), "edit");
        assert_eq!(TooltipState::default(), TooltipState::Hidden);
    }

    #[test]
    fn test_root_class_tracks_the_state() {
        let owner = Owner::new();
        owner.set();

        let tooltip = LinkTooltip::new();
        assert_eq!(
            tooltip.root_class(),
            "folio-link-tooltip folio-link-tooltip-hidden"
        );

        tooltip.state.set(TooltipState::View);
        assert_eq!(
            tooltip.root_class(),
            "folio-link-tooltip folio-link-tooltip-state-view"
        );

        tooltip.state.set(TooltipState::Edit);
        assert!(tooltip.root_class().ends_with("-state-edit"));
    }

    #[test]
    fn test_root_style_is_plain_pixel_offsets() {
        let owner = Owner::new();
        owner.set();

        let tooltip = LinkTooltip::new();
        tooltip.placement.set(crate::editor::placement::Placement {
            top: 12.5,
            left: -3.0,
        });
        assert_eq!(tooltip.root_style(), "top: 12.5px; left: -3px;");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn doc() -> web_sys::Document {
        web_sys::window().unwrap().document().unwrap()
    }

    /// Builds a full editor fixture: wrapper > (surface, form > input+button).
    fn mounted_tooltip(surface_html: &str) -> (LinkTooltip, web_sys::HtmlElement) {
        let owner = Owner::new();
        owner.set();

        let d = doc();
        let wrapper: web_sys::HtmlElement = d.create_element("div").unwrap().unchecked_into();
        let surface: web_sys::HtmlElement = d.create_element("div").unwrap().unchecked_into();
        surface.set_attribute("contenteditable", "true").unwrap();
        surface.set_inner_html(surface_html);
        let root: web_sys::HtmlElement = d.create_element("form").unwrap().unchecked_into();
        let input: web_sys::HtmlInputElement =
            d.create_element("input").unwrap().unchecked_into();
        let remove_btn: web_sys::HtmlElement = d.create_element("button").unwrap().unchecked_into();

        root.append_child(&input).unwrap();
        root.append_child(&remove_btn).unwrap();
        wrapper.append_child(&surface).unwrap();
        wrapper.append_child(&root).unwrap();
        d.body().unwrap().append_child(&wrapper).unwrap();

        let tooltip = LinkTooltip::new();
        tooltip.attach(TooltipElements {
            wrapper: wrapper.clone(),
            surface,
            root,
            input,
            remove_btn,
        });

        (tooltip, wrapper)
    }

    fn place_caret(node: &web_sys::Node, offset: u32) {
        let sel = web_sys::window().unwrap().get_selection().unwrap().unwrap();
        sel.remove_all_ranges().unwrap();
        let range = doc().create_range().unwrap();
        range.set_start(node, offset).unwrap();
        range.set_end(node, offset).unwrap();
        sel.add_range(&range).unwrap();
    }

    #[wasm_bindgen_test]
    fn test_teardown_is_idempotent() {
        let (tooltip, wrapper) = mounted_tooltip("<p>some text</p>");

        let text = wrapper.query_selector("p").unwrap().unwrap();
        let range = doc().create_range().unwrap();
        range.select_node_contents(&text).unwrap();
        tooltip.show(
            TooltipState::Edit,
            None,
            String::new(),
            Some(range),
        );
        assert!(tooltip.is_edit());

        tooltip.teardown();
        assert_eq!(tooltip.state.get_untracked(), TooltipState::Hidden);
        assert!(tooltip.arm_timer.get_value().is_none());
        assert!(tooltip.resize_handle.with_value(|h| h.is_none()));
        assert!(tooltip.pending_range.with_value(|r| r.is_none()));

        // Second teardown changes nothing and panics nowhere.
        tooltip.teardown();
        assert_eq!(tooltip.state.get_untracked(), TooltipState::Hidden);

        wrapper.remove();
    }

    #[wasm_bindgen_test]
    fn test_jump_links_never_open_a_tooltip() {
        let (tooltip, wrapper) = mounted_tooltip(
            "<p><a href=\"/inside\" class=\"is-jump-link\">home</a></p>",
        );
        let link = wrapper.query_selector("a").unwrap().unwrap();
        place_caret(&link.child_nodes().item(0).unwrap(), 2);

        assert!(!tooltip.query_state());
        assert_eq!(tooltip.state.get_untracked(), TooltipState::Hidden);

        // The explicit command refuses them too.
        tooltip.execute();
        assert_eq!(tooltip.state.get_untracked(), TooltipState::Hidden);

        wrapper.remove();
    }

    #[wasm_bindgen_test]
    fn test_caret_in_a_follow_link_opens_view() {
        let (tooltip, wrapper) = mounted_tooltip(
            "<p><a href=\"https://x.test/artist/42\" class=\"is-follow-link\">Monet</a>\
             <a class=\"entity-follow artist-follow\" data-id=\"42\"></a></p>",
        );
        let link = wrapper.query_selector("a.is-follow-link").unwrap().unwrap();
        place_caret(&link.child_nodes().item(0).unwrap(), 3);

        assert!(tooltip.query_state());
        assert_eq!(tooltip.state.get_untracked(), TooltipState::View);
        assert_eq!(tooltip.href.get_untracked(), "https://x.test/artist/42");

        // Re-running on the same link keeps the state without churn.
        assert!(tooltip.query_state());
        assert_eq!(tooltip.state.get_untracked(), TooltipState::View);

        tooltip.destroy();
        wrapper.remove();
    }

    #[wasm_bindgen_test]
    fn test_edit_command_passes_over_follow_links() {
        let (tooltip, wrapper) = mounted_tooltip(
            "<p><a href=\"https://x.test/artist/42\" class=\"is-follow-link\">Monet</a></p>",
        );
        let link = wrapper.query_selector("a").unwrap().unwrap();
        place_caret(&link.child_nodes().item(0).unwrap(), 1);

        tooltip.execute();
        assert_eq!(tooltip.state.get_untracked(), TooltipState::Hidden);

        wrapper.remove();
    }

    #[wasm_bindgen_test]
    fn test_edit_command_widens_onto_a_bare_link() {
        let (tooltip, wrapper) =
            mounted_tooltip("<p><a href=\"https://elsewhere.test\">Degas</a></p>");
        let link = wrapper.query_selector("a").unwrap().unwrap();
        place_caret(&link.child_nodes().item(0).unwrap(), 2);

        tooltip.execute();
        assert_eq!(tooltip.state.get_untracked(), TooltipState::Edit);
        assert_eq!(tooltip.href.get_untracked(), "https://elsewhere.test");
        assert!(tooltip
            .active_link
            .with_value(|l| l.as_ref().unwrap().is_same_node(Some(link.as_ref()))));

        tooltip.destroy();
        wrapper.remove();
    }

    #[wasm_bindgen_test]
    fn test_submitting_over_plain_text_links_it_up() {
        let (tooltip, wrapper) = mounted_tooltip("<p>Monet painted light.</p>");
        let text = wrapper
            .query_selector("p")
            .unwrap()
            .unwrap()
            .child_nodes()
            .item(0)
            .unwrap();

        let range = doc().create_range().unwrap();
        range.set_start(&text, 0).unwrap();
        range.set_end(&text, 5).unwrap();
        tooltip.show(TooltipState::Edit, None, String::new(), Some(range));

        tooltip
            .elements
            .get_value()
            .unwrap()
            .input
            .set_value("  https://x.test/artist/42?ref=feed  ");
        tooltip.submit();

        assert_eq!(tooltip.state.get_untracked(), TooltipState::Hidden);

        let link = wrapper.query_selector("a.is-follow-link").unwrap().unwrap();
        assert_eq!(
            link.get_attribute("href").unwrap(),
            "https://x.test/artist/42"
        );
        assert_eq!(link.text_content().unwrap(), "Monet");
        let marker = link.next_element_sibling().unwrap();
        assert_eq!(marker.get_attribute("data-id").unwrap(), "42");

        wrapper.remove();
    }

    #[wasm_bindgen_test]
    fn test_remove_strips_the_link_and_its_marker() {
        let (tooltip, wrapper) = mounted_tooltip(
            "<p>by <a href=\"https://x.test/artist/42\" class=\"is-follow-link\">Monet</a>\
             <a class=\"entity-follow artist-follow\" data-id=\"42\"></a>.</p>",
        );
        let link = wrapper.query_selector("a.is-follow-link").unwrap().unwrap();
        place_caret(&link.child_nodes().item(0).unwrap(), 0);

        assert!(tooltip.query_state());
        assert_eq!(tooltip.state.get_untracked(), TooltipState::View);

        tooltip.remove_current();

        assert_eq!(tooltip.state.get_untracked(), TooltipState::Hidden);
        assert!(wrapper.query_selector("a").unwrap().is_none());
        assert_eq!(
            wrapper.query_selector("p").unwrap().unwrap().text_content().unwrap(),
            "by Monet."
        );

        wrapper.remove();
    }
}
