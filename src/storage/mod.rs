use crate::models::Article;
use serde::{Deserialize, Serialize};

pub(crate) const DRAFTS_KEY: &str = "folio_drafts";
pub(crate) const LAST_DRAFT_KEY: &str = "folio_last_draft_id";

/// Hard cap on locally retained drafts; the least recently saved fall off.
pub(crate) const MAX_DRAFTS: usize = 50;

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn upsert_lru_by_key<T: Clone>(
    mut items: Vec<T>,
    item: T,
    same_key: impl Fn(&T, &T) -> bool,
    max: usize,
) -> Vec<T> {
    items.retain(|x| !same_key(x, &item));
    items.insert(0, item);
    if items.len() > max {
        items.truncate(max);
    }
    items
}

pub(crate) fn load_drafts() -> Vec<Article> {
    load_json_from_storage::<Vec<Article>>(DRAFTS_KEY).unwrap_or_default()
}

/// Saves a draft and moves it to the front of the list.
pub(crate) fn upsert_draft(draft: &Article) -> Vec<Article> {
    let next = upsert_lru_by_key(load_drafts(), draft.clone(), |a, b| a.id == b.id, MAX_DRAFTS);
    save_json_to_storage(DRAFTS_KEY, &next);
    next
}

/// Wholesale replacement, used after a sync merge.
pub(crate) fn save_drafts(drafts: &[Article]) {
    save_json_to_storage(DRAFTS_KEY, &drafts);
}

pub(crate) fn delete_draft(id: &str) -> Vec<Article> {
    let mut drafts = load_drafts();
    drafts.retain(|d| d.id != id);
    save_json_to_storage(DRAFTS_KEY, &drafts);
    drafts
}

pub(crate) fn find_draft(id: &str) -> Option<Article> {
    load_drafts().into_iter().find(|d| d.id == id)
}

pub(crate) fn write_last_draft_id(id: &str) {
    if id.trim().is_empty() {
        return;
    }
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(LAST_DRAFT_KEY, id);
    }
}

pub(crate) fn load_last_draft_id() -> Option<String> {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
    storage.get_item(LAST_DRAFT_KEY).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str, updated_ms: i64) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Draft {id}"),
            body_html: String::new(),
            updated_ms,
        }
    }

    #[test]
    fn test_lru_upsert_moves_existing_to_front() {
        let items = vec![draft("a", 1), draft("b", 2), draft("c", 3)];
        let next = upsert_lru_by_key(items, draft("c", 9), |a, b| a.id == b.id, 10);
        let ids: Vec<&str> = next.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(next[0].updated_ms, 9);
    }

    #[test]
    fn test_lru_upsert_truncates_at_cap() {
        let items = vec![draft("a", 1), draft("b", 2)];
        let next = upsert_lru_by_key(items, draft("new", 3), |a, b| a.id == b.id, 2);
        let ids: Vec<&str> = next.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["new", "a"]);
    }
}
