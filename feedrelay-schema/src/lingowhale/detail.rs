use serde::{Deserialize, Serialize};

/// Envelope returned by `GET /api/entry/detail`.
#[derive(Debug, Deserialize, Serialize)]
pub struct EntryDetailResponse {
    pub code: i64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EntryDetailData>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EntryDetailData {
    #[serde(default)]
    pub url_info: UrlInfo,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct UrlInfo {
    /// Plain-text body.
    #[serde(default, deserialize_with = "crate::lax::string_lax")]
    pub content: String,

    #[serde(default, deserialize_with = "crate::lax::string_lax")]
    pub html_content: String,

    #[serde(default, deserialize_with = "crate::lax::string_lax")]
    pub author: String,

    #[serde(default, deserialize_with = "crate::lax::string_lax")]
    pub publish_time: String,
}
