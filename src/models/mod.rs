use serde::{Deserialize, Serialize};

/// A locally persisted article draft.
///
/// `body_html` is the editor surface's innerHTML verbatim, including any
/// follow-link markup (`is-follow-link` anchors and their `entity-follow`
/// markers). The backend stores it as an opaque string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Article {
    pub id: String,
    pub title: String,

    #[serde(rename = "body-html")]
    pub body_html: String,

    #[serde(rename = "updated-ms")]
    pub updated_ms: i64,
}
