use crate::models::Article;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:7878".to_string();

        // We support BOTH `window.ENV.API_URL` (documented style) and
        // `window.ENV.api_url` (legacy/implementation detail) for compatibility.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }

                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"api_url".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort article sync against a folio backend.
///
/// The app is local-first: every call site treats a failure here as
/// "stay offline", surfaces the message, and keeps working from storage.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new().api_url)
    }

    pub async fn list_articles(&self) -> ApiResult<Vec<Article>> {
        let data: serde_json::Value = self.request_api("GET", "/articles", None::<&()>).await?;
        Ok(Self::parse_article_list_response(data))
    }

    pub async fn upsert_article(&self, article: &Article) -> ApiResult<serde_json::Value> {
        self.request_api("POST", "/articles/upsert", Some(article))
            .await
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = match method {
            "GET" => client.get(url),
            _ => client.post(url),
        };

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }

    pub(crate) fn parse_article_list_response(data: serde_json::Value) -> Vec<Article> {
        let list = data
            .get("articles")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        list.into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }
}

/// Merges server articles into the local list; the newer `updated_ms` wins
/// per id, and ordering follows recency.
pub(crate) fn merge_articles(local: Vec<Article>, remote: Vec<Article>) -> Vec<Article> {
    let mut merged = local;

    for r in remote {
        match merged.iter_mut().find(|d| d.id == r.id) {
            Some(existing) => {
                if r.updated_ms > existing.updated_ms {
                    *existing = r;
                }
            }
            None => merged.push(r),
        }
    }

    merged.sort_by(|a, b| b.updated_ms.cmp(&a.updated_ms));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, updated_ms: i64) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Article {id}"),
            body_html: String::new(),
            updated_ms,
        }
    }

    #[test]
    fn test_article_list_response_tolerates_junk_entries() {
        let data = serde_json::json!({
            "articles": [
                {"id": "a", "title": "A", "body-html": "<p>x</p>", "updated-ms": 5},
                {"unexpected": true},
            ]
        });
        let parsed = ApiClient::parse_article_list_response(data);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "a");
        assert_eq!(parsed[0].body_html, "<p>x</p>");
    }

    #[test]
    fn test_article_list_response_without_field_is_empty() {
        let parsed = ApiClient::parse_article_list_response(serde_json::json!({"ok": true}));
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_merge_keeps_newer_side_per_id() {
        let local = vec![article("a", 10), article("b", 20)];
        let remote = vec![article("a", 15), article("c", 5)];

        let merged = merge_articles(local, remote);
        let ids: Vec<&str> = merged.iter().map(|a| a.id.as_str()).collect();

        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(merged[1].updated_ms, 15, "remote a was newer");
    }

    #[test]
    fn test_merge_prefers_local_on_equal_timestamps() {
        let mut local_a = article("a", 10);
        local_a.title = "local".to_string();
        let mut remote_a = article("a", 10);
        remote_a.title = "remote".to_string();

        let merged = merge_articles(vec![local_a], vec![remote_a]);
        assert_eq!(merged[0].title, "local");
    }
}
