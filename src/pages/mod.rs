use crate::api::{merge_articles, ApiErrorKind};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardItem, CardList, CardTitle, Input, Label, Spinner,
};
use crate::editor::ArticleEditor;
use crate::models::Article;
use crate::state::AppContext;
use crate::storage::{delete_draft, find_draft, load_last_draft_id, save_drafts, upsert_draft, write_last_draft_id};
use crate::util::{fmt_updated, mint_draft_id, now_ms};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_query_map};
use leptos_router::params::Params;
use wasm_bindgen::JsCast;

/// Idle delay before pushing an edited draft to the backend.
const REMOTE_PUSH_DEBOUNCE_MS: i32 = 1200;

pub(crate) fn display_title(title: &str) -> &str {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        "Untitled"
    } else {
        trimmed
    }
}

#[component]
pub fn HomePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let drafts = app_state.0.drafts;
    let syncing = app_state.0.syncing;
    let sync_error = app_state.0.sync_error;
    let api_client = app_state.0.api_client;

    let navigate = StoredValue::new(use_navigate());
    let new_title: RwSignal<String> = RwSignal::new(String::new());

    // Push everything local, then pull and merge. Any failure aborts the
    // round and leaves the local list untouched.
    let run_sync = move || {
        if syncing.get_untracked() {
            return;
        }
        syncing.set(true);
        sync_error.set(None);

        let api = api_client.get_untracked();
        let local = drafts.get_untracked();
        spawn_local(async move {
            let mut failure: Option<String> = None;

            for article in &local {
                if let Err(e) = api.upsert_article(article).await {
                    failure = Some(e.to_string());
                    break;
                }
            }

            if failure.is_none() {
                match api.list_articles().await {
                    Ok(remote) => {
                        let merged = merge_articles(local, remote);
                        save_drafts(&merged);
                        drafts.set(merged);
                    }
                    Err(e) => failure = Some(e.to_string()),
                }
            }

            sync_error.set(failure);
            syncing.set(false);
        });
    };

    let on_create = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let title = new_title.get_untracked().trim().to_string();
        new_title.set(String::new());

        let path = if title.is_empty() {
            "/editor".to_string()
        } else {
            format!("/editor?title={}", urlencoding::encode(&title))
        };
        navigate.get_value()(&path, Default::default());
    };

    // The most recently opened draft, if it still exists.
    let last_draft_id = move || {
        let last = load_last_draft_id()?;
        drafts
            .get()
            .iter()
            .find(|d| d.id == last)
            .map(|d| d.id.clone())
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[860px] px-4 py-8">
                <div class="mb-4 flex items-center justify-between">
                    <div class="space-y-1">
                        <h1 class="text-xl font-semibold">"Folio"</h1>
                        <p class="text-xs text-muted-foreground">"Local-first article drafts"</p>
                    </div>

                    <div class="flex items-center gap-2">
                        <Show when=move || last_draft_id().is_some() fallback=|| ().into_view()>
                            <a
                                class="text-xs text-primary underline underline-offset-4"
                                href=move || {
                                    format!("/editor/{}", last_draft_id().unwrap_or_default())
                                }
                            >
                                "Continue writing"
                            </a>
                        </Show>

                        <Button
                            variant=ButtonVariant::Outline
                            attr:disabled=move || syncing.get()
                            on:click=move |_| run_sync()
                        >
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || syncing.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if syncing.get() { "Syncing..." } else { "Sync" }}
                            </span>
                        </Button>
                    </div>
                </div>

                <Show when=move || sync_error.get().is_some() fallback=|| ().into_view()>
                    {move || {
                        sync_error.get().map(|e| view! {
                            <Alert class="mb-4 border-destructive/30">
                                <AlertDescription class="text-destructive">{e}</AlertDescription>
                            </Alert>
                        })
                    }}
                </Show>

                <Card>
                    <CardHeader>
                        <CardTitle>"Start something"</CardTitle>
                        <CardDescription>
                            "Drafts live in this browser until you sync them."
                        </CardDescription>
                    </CardHeader>
                    <CardContent>
                        <form class="flex items-center gap-2" on:submit=on_create>
                            <Input
                                id="new_title"
                                placeholder="Article title"
                                bind_value=new_title
                            />
                            <Button>"New article"</Button>
                        </form>
                    </CardContent>
                </Card>

                <Card class="mt-4">
                    <CardHeader>
                        <CardTitle>"Drafts"</CardTitle>
                        <CardDescription>
                            {move || format!("{} total", drafts.get().len())}
                        </CardDescription>
                    </CardHeader>
                    <CardContent>
                        <Show
                            when=move || !drafts.get().is_empty()
                            fallback=|| view! {
                                <div class="text-xs text-muted-foreground">
                                    "Nothing here yet. Start an article above."
                                </div>
                            }
                        >
                            <CardList>
                                {move || {
                                    let now = now_ms();
                                    drafts
                                        .get()
                                        .into_iter()
                                        .map(|a| {
                                            let delete_id = a.id.clone();
                                            view! {
                                                <CardItem class="justify-between rounded-md border px-4 py-3">
                                                    <div class="flex min-w-0 flex-col gap-1">
                                                        <a
                                                            class="truncate text-sm font-medium hover:underline"
                                                            href=format!("/editor/{}", a.id)
                                                        >
                                                            {display_title(&a.title).to_string()}
                                                        </a>
                                                        <div class="text-xs text-muted-foreground">
                                                            {fmt_updated(now, a.updated_ms)}
                                                        </div>
                                                    </div>
                                                    <Button
                                                        variant=ButtonVariant::Ghost
                                                        size=ButtonSize::Sm
                                                        class="text-destructive hover:text-destructive"
                                                        on:click=move |_| {
                                                            drafts.set(delete_draft(&delete_id));
                                                        }
                                                    >
                                                        "Delete"
                                                    </Button>
                                                </CardItem>
                                            }
                                        })
                                        .collect_view()
                                }}
                            </CardList>
                        </Show>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct EditorRouteParams {
    pub draft_id: Option<String>,
}

#[component]
pub fn EditorPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let drafts = app_state.0.drafts;
    let sync_error = app_state.0.sync_error;
    let api_client = app_state.0.api_client;

    let params = leptos_router::hooks::use_params::<EditorRouteParams>();
    let navigate = StoredValue::new(use_navigate());

    // Closures so params access happens inside a reactive tracking context.
    let param_id = move || {
        params
            .get()
            .ok()
            .and_then(|p| p.draft_id)
            .filter(|id| !id.trim().is_empty())
    };

    // Draft mode (Roam-style): `/editor?title=...` opens a blank article and
    // nothing is stored until the first real edit.
    let query = use_query_map();
    let query_title = move || query.get().get("title").unwrap_or_default();

    let title_value: RwSignal<String> = RwSignal::new(String::new());
    // Snapshot of the last loaded/persisted title, to tell user edits apart
    // from programmatic sets.
    let title_snapshot: RwSignal<String> = RwSignal::new(String::new());
    let body_html: RwSignal<String> = RwSignal::new(String::new());

    // The persisted identity of what we're editing; None until draft mode
    // mints one.
    let draft_id: RwSignal<Option<String>> = RwSignal::new(None);
    // Which route target the signals currently hold, so the resolve effect
    // runs once per navigation.
    let resolved: RwSignal<Option<String>> = RwSignal::new(None);

    Effect::new(move |_| {
        let id = param_id();
        let qt = query_title();
        let key = match &id {
            Some(id) => format!("draft:{id}"),
            None => format!("new:{qt}"),
        };
        if resolved.get_untracked().as_deref() == Some(key.as_str()) {
            return;
        }
        resolved.set(Some(key));

        match id {
            Some(id) => {
                // A dangling id (deleted draft, stale bookmark) starts over
                // under the same identity.
                let (t, b) = find_draft(&id)
                    .map(|a| (a.title, a.body_html))
                    .unwrap_or_default();
                title_snapshot.set(t.clone());
                title_value.set(t);
                body_html.set(b);
                draft_id.set(Some(id.clone()));
                write_last_draft_id(&id);
            }
            None => {
                title_snapshot.set(qt.clone());
                title_value.set(qt);
                body_html.set(String::new());
                draft_id.set(None);
            }
        }
    });

    // Local persistence is immediate; the first edit in draft mode mints
    // the id and swaps the URL in place.
    let persist_local = move |title: String, body: String| -> Article {
        let id = match draft_id.get_untracked() {
            Some(id) => id,
            None => {
                let id = mint_draft_id();
                draft_id.set(Some(id.clone()));
                write_last_draft_id(&id);
                navigate.get_value()(
                    &format!("/editor/{id}"),
                    leptos_router::NavigateOptions {
                        replace: true,
                        ..Default::default()
                    },
                );
                id
            }
        };

        let article = Article {
            id,
            title,
            body_html: body,
            updated_ms: now_ms(),
        };
        drafts.set(upsert_draft(&article));
        article
    };

    // Server push: idle debounce, latest edit wins.
    let remote_timer: RwSignal<Option<i32>> = RwSignal::new(None);
    let schedule_remote = move |article: Article| {
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Some(tid) = remote_timer.get_untracked() {
            let _ = win.clear_timeout_with_handle(tid);
        }

        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                wasm_bindgen::closure::Closure::once_into_js(move || {
                    remote_timer.set(None);
                    let api = api_client.get_untracked();
                    spawn_local(async move {
                        match api.upsert_article(&article).await {
                            Ok(_) => sync_error.set(None),
                            // Being offline while typing is routine; the
                            // explicit sync round reports it instead.
                            Err(e) if e.kind == ApiErrorKind::Network => {}
                            Err(e) => sync_error.set(Some(e.to_string())),
                        }
                    });
                })
                .as_ref()
                .unchecked_ref(),
                REMOTE_PUSH_DEBOUNCE_MS,
            )
            .unwrap_or(0);
        remote_timer.set(Some(tid));
    };

    on_cleanup(move || {
        // Local state is already saved; the server catches up on the next
        // sync round.
        if let Some(tid) = remote_timer.get_untracked() {
            if let Some(win) = web_sys::window() {
                win.clear_timeout_with_handle(tid);
            }
        }
    });

    // Title edits flow through the bound signal; skip programmatic sets.
    Effect::new(move |_| {
        let t = title_value.get();
        if t == title_snapshot.get_untracked() {
            return;
        }
        title_snapshot.set(t.clone());
        let article = persist_local(t, body_html.get_untracked());
        schedule_remote(article);
    });

    let on_body_input = move |html: String| {
        body_html.set(html.clone());
        let article = persist_local(title_value.get_untracked(), html);
        schedule_remote(article);
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[860px] px-4 py-8">
                <div class="mb-4 flex items-center justify-between">
                    <a href="/" class="text-sm font-medium text-foreground">"Folio"</a>
                    <p class="text-xs text-muted-foreground">"Saved locally as you type"</p>
                </div>

                <Show when=move || sync_error.get().is_some() fallback=|| ().into_view()>
                    {move || {
                        sync_error.get().map(|e| view! {
                            <Alert class="mb-4 border-destructive/30">
                                <AlertDescription class="text-destructive">{e}</AlertDescription>
                            </Alert>
                        })
                    }}
                </Show>

                <div class="mb-4 flex flex-col gap-2">
                    <Label html_for="article_title">"Title"</Label>
                    <Input id="article_title" placeholder="Untitled" bind_value=title_value />
                </div>

                <ArticleEditor body=move || body_html.get() on_input=on_body_input />
            </div>
        </div>
    }
}
