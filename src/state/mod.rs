use crate::api::ApiClient;
use crate::models::Article;
use crate::storage::load_drafts;
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Local draft list, newest first. Hydrated from storage on startup;
    /// every storage write flows back through this signal.
    pub drafts: RwSignal<Vec<Article>>,

    /// Background sync status for the header/footer lines.
    pub syncing: RwSignal<bool>,
    pub sync_error: RwSignal<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::from_env()),
            drafts: RwSignal::new(load_drafts()),
            syncing: RwSignal::new(false),
            sync_error: RwSignal::new(None),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
