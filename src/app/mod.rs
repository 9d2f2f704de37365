use crate::pages::{EditorPage, HomePage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            // Unknown paths land on the draft list; in a local-first app
            // that is always a safe place to be.
            <Routes fallback=|| view! { <HomePage /> }>
                <Route path=path!("editor") view=EditorPage />
                <Route path=path!("editor/:draft_id") view=EditorPage />
                <Route path=path!("") view=HomePage />
            </Routes>
        </Router>
    }
}
