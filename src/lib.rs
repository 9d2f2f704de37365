mod api;
mod app;
mod components;
mod editor;
mod models;
mod pages;
mod state;
mod storage;
mod util;

use crate::app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

#[cfg(test)]
mod tests {
    use crate::models::Article;

    #[test]
    fn test_article_wire_contract_uses_kebab_case_fields() {
        // Contract with the folio backend's article payloads.
        let json = r#"{
            "id": "draft-1700000000000-1",
            "title": "Water Lilies",
            "body-html": "<p>Monet</p>",
            "updated-ms": 1700000000000
        }"#;
        let parsed: Article = serde_json::from_str(json).expect("article should parse");
        assert_eq!(parsed.id, "draft-1700000000000-1");
        assert_eq!(parsed.title, "Water Lilies");
        assert_eq!(parsed.body_html, "<p>Monet</p>");
        assert_eq!(parsed.updated_ms, 1_700_000_000_000);

        let v = serde_json::to_value(&parsed).expect("article should serialize");
        assert_eq!(v["body-html"], "<p>Monet</p>");
        assert_eq!(v["updated-ms"], 1_700_000_000_000_i64);
        assert!(v.get("body_html").is_none());
    }
}
