//! The rich-text article surface and its link tooling.
//!
//! The surface is a plain contenteditable region; everything interesting
//! lives in the link tooltip (`tooltip`), the DOM mutation engine
//! (`mutation`) and the selection helpers around them. The component here
//! only wires those pieces to real elements and to the page's autosave.

pub(crate) mod anchor;
pub(crate) mod handoff;
pub(crate) mod mutation;
pub(crate) mod placement;
pub(crate) mod selection;
pub(crate) mod tooltip;

use crate::editor::tooltip::{LinkTooltip, TooltipElements, NAMESPACE};
use leptos::html;
use leptos::prelude::*;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Ctrl+K (Cmd+K on mac) opens the link editor.
pub(crate) fn is_link_shortcut(key: &str, ctrl: bool, meta: bool) -> bool {
    (ctrl || meta) && key.eq_ignore_ascii_case("k")
}

#[component]
pub fn ArticleEditor(
    /// Reactive source for the surface markup. The surface re-renders only
    /// when this diverges from what it already shows, so feeding edits
    /// back through it is loop-free.
    body: impl Fn() -> String + Clone + Send + Sync + 'static,
    /// Called with the full surface markup after every input.
    on_input: impl Fn(String) + Clone + Send + Sync + 'static,
) -> impl IntoView {
    let tooltip = LinkTooltip::new();

    let wrapper_ref: NodeRef<html::Div> = NodeRef::new();
    let surface_ref: NodeRef<html::Div> = NodeRef::new();
    let form_ref: NodeRef<html::Form> = NodeRef::new();
    let input_ref: NodeRef<html::Input> = NodeRef::new();
    let remove_ref: NodeRef<html::Button> = NodeRef::new();

    let editor_id: StoredValue<Option<usize>> = StoredValue::new(None);
    let selection_listener: StoredValue<Option<Closure<dyn FnMut()>>, LocalStorage> =
        StoredValue::new_local(None);

    // Wire the controller once all refs have mounted.
    let t_attach = tooltip.clone();
    Effect::new(move |_| {
        let (Some(wrapper), Some(surface), Some(form), Some(input), Some(remove_btn)) = (
            wrapper_ref.get(),
            surface_ref.get(),
            form_ref.get(),
            input_ref.get(),
            remove_ref.get(),
        ) else {
            return;
        };
        if editor_id.get_value().is_some() {
            return;
        }

        t_attach.attach(TooltipElements {
            wrapper: wrapper.into(),
            surface: surface.clone().into(),
            root: form.into(),
            input,
            remove_btn: remove_btn.into(),
        });

        // Clicks that dismiss another editor's tooltip can land the caret
        // here; the broker tells us to re-check.
        let t2 = t_attach.clone();
        let id = handoff::register(
            surface.clone().into(),
            Rc::new(move || {
                t2.query_state();
            }),
        );
        editor_id.set_value(Some(id));

        // Caret tracking. The controller scopes itself to its own surface,
        // so forwarding every document-level change is safe.
        let t3 = t_attach.clone();
        let on_selection = Closure::wrap(Box::new(move || {
            t3.query_state();
        }) as Box<dyn FnMut()>);
        if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
            let _ = doc.add_event_listener_with_callback(
                "selectionchange",
                on_selection.as_ref().unchecked_ref(),
            );
        }
        selection_listener.set_value(Some(on_selection));
    });

    // Push external body changes (draft switch, initial load) into the
    // surface. Edits round-trip through `on_input`, so the comparison
    // holds while typing.
    let body_for_sync = body.clone();
    let t_sync = tooltip.clone();
    Effect::new(move |_| {
        let html = body_for_sync();
        let Some(surface) = surface_ref.get() else {
            return;
        };
        if surface.inner_html() != html {
            t_sync.teardown();
            surface.set_inner_html(&html);
        }
    });

    let t_cleanup = tooltip.clone();
    on_cleanup(move || {
        if let Some(id) = editor_id.get_value() {
            handoff::unregister(id);
        }
        selection_listener.update_value(|l| {
            if let Some(l) = l.take() {
                if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
                    let _ = doc.remove_event_listener_with_callback(
                        "selectionchange",
                        l.as_ref().unchecked_ref(),
                    );
                }
            }
        });
        t_cleanup.destroy();
    });

    let t_btn = tooltip.clone();
    let t_btn_class = tooltip.clone();
    let t_key = tooltip.clone();
    let t_class = tooltip.clone();
    let t_style = tooltip.clone();
    let t_state = tooltip.clone();
    let t_href = tooltip.clone();
    let t_href_text = tooltip.clone();

    view! {
        <div data-name="ArticleEditor">
            <div class="mb-2 flex items-center gap-1 border-b border-border pb-2">
                <button
                    type="button"
                    title="Link selection (Ctrl+K)"
                    class=move || {
                        if t_btn_class.link_active() || t_btn_class.is_edit() {
                            "rounded-md bg-accent px-2 py-1 text-xs font-medium text-accent-foreground"
                        } else {
                            "rounded-md px-2 py-1 text-xs font-medium text-muted-foreground hover:bg-accent hover:text-accent-foreground"
                        }
                    }
                    // mousedown instead of click: the surface selection must
                    // survive the press.
                    on:mousedown=move |ev| {
                        ev.prevent_default();
                        t_btn.execute();
                    }
                >
                    "Link"
                </button>
            </div>

            <div class="relative" node_ref=wrapper_ref>
                <div
                    node_ref=surface_ref
                    class="article-surface min-h-40 rounded-md border border-input bg-background px-3 py-2 text-sm leading-6 focus:outline-none focus:ring-1 focus:ring-ring"
                    contenteditable="true"
                    on:input=move |_| {
                        if let Some(surface) = surface_ref.get_untracked() {
                            on_input(surface.inner_html());
                        }
                    }
                    on:keydown=move |ev| {
                        if is_link_shortcut(&ev.key(), ev.ctrl_key(), ev.meta_key()) {
                            ev.prevent_default();
                            t_key.execute();
                        }
                    }
                ></div>

                // All tooltip children stay mounted; the state class drives
                // which row is visible. Hiding uses visibility so the form
                // keeps a measurable width for centering.
                <form
                    node_ref=form_ref
                    data-name="LinkTooltip"
                    data-state=move || t_state.state_attr()
                    class=move || t_class.root_class()
                    style=move || t_style.root_style()
                >
                    <div class=format!("{NAMESPACE}-view-row flex items-center gap-2")>
                        <a
                            class="max-w-60 truncate text-xs text-primary underline underline-offset-2"
                            href=move || t_href.current_href()
                            target="_blank"
                            rel="noopener noreferrer"
                        >
                            {move || t_href_text.current_href()}
                        </a>
                    </div>
                    <div class=format!("{NAMESPACE}-edit-row flex items-center gap-2")>
                        <input
                            node_ref=input_ref
                            type="text"
                            placeholder="Paste in the URL of the artist"
                            class="h-8 w-64 rounded-md border border-input bg-background px-2 text-xs focus:outline-none focus:ring-1 focus:ring-ring"
                        />
                        <button
                            type="submit"
                            class="h-8 rounded-md bg-primary px-2 text-xs font-medium text-primary-foreground hover:bg-primary/90"
                        >
                            "Apply"
                        </button>
                    </div>
                    <button
                        node_ref=remove_ref
                        type="button"
                        class=format!("{NAMESPACE}-remove h-8 rounded-md px-2 text-xs font-medium text-destructive hover:bg-destructive/10")
                    >
                        "Remove"
                    </button>
                </form>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_shortcut_wants_a_modifier() {
        assert!(is_link_shortcut("k", true, false));
        assert!(is_link_shortcut("K", false, true));
        assert!(!is_link_shortcut("k", false, false));
        assert!(!is_link_shortcut("j", true, false));
    }
}
