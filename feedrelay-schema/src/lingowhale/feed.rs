use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Request body for `POST /api/feed/v2/feed/subscription`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeedSubscriptionRequest {
    /// Empty string requests the first page.
    pub cursor: String,
    pub sort_type: i64,
    pub limit: u32,
    pub filter_unread: bool,
    pub channel_ids: Vec<String>,
}

/// Envelope returned by the subscription endpoint.
///
/// `code` is required: a body without it is not a feed response at all.
#[derive(Debug, Deserialize, Serialize)]
pub struct FeedSubscriptionResponse {
    pub code: i64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FeedSubscriptionData>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FeedSubscriptionData {
    #[serde(default)]
    pub feed_list: Vec<FeedListItem>,

    /// Next-page cursor; empty means there is no further page.
    #[serde(default, deserialize_with = "crate::lax::string_lax")]
    pub cursor: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeedListItem {
    #[serde(deserialize_with = "crate::lax::string_lax")]
    pub entry_id: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<i64>,

    #[serde(default, deserialize_with = "crate::lax::string_lax")]
    pub title: String,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}
