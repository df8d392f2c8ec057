use serde::{Deserialize, Serialize};
use url::Url;

/// Feed source endpoints and paging knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// TOML: `feed.feed_url`.
    #[serde(default = "default_feed_url")]
    pub feed_url: Url,

    /// TOML: `feed.detail_url`.
    #[serde(default = "default_detail_url")]
    pub detail_url: Url,

    /// Items requested per page. TOML: `feed.page_size`. Default: `10`.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upstream sort selector; `2` is newest-first. TOML: `feed.sort_type`. Default: `2`.
    #[serde(default = "default_sort_type")]
    pub sort_type: i64,

    /// Channel walked by sources that list no channel ids.
    /// TOML: `feed.default_channel_id`.
    #[serde(default = "default_channel_id")]
    pub default_channel_id: String,

    /// Entry type sent to the detail endpoint when the list item omits one.
    /// TOML: `feed.default_entry_type`. Default: `7`.
    #[serde(default = "default_entry_type")]
    pub default_entry_type: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            detail_url: default_detail_url(),
            page_size: default_page_size(),
            sort_type: default_sort_type(),
            default_channel_id: default_channel_id(),
            default_entry_type: default_entry_type(),
        }
    }
}

fn default_feed_url() -> Url {
    Url::parse("https://api-public.lingowhale.com/api/feed/v2/feed/subscription")
        .expect("valid feed subscription URL")
}

fn default_detail_url() -> Url {
    Url::parse("https://api.lingowhale.com/api/entry/detail").expect("valid entry detail URL")
}

fn default_page_size() -> u32 {
    10
}

fn default_sort_type() -> i64 {
    2
}

fn default_channel_id() -> String {
    "6813a8c550ec085890ddaf46".to_string()
}

fn default_entry_type() -> i64 {
    7
}
