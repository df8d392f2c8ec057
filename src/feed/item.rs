use feedrelay_schema::{FeedListItem, UrlInfo};

/// One row of a feed page: enough to dedup and to ask for the detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub entry_id: String,
    pub entry_type: Option<i64>,
    pub title: String,
}

impl From<FeedListItem> for FeedEntry {
    fn from(item: FeedListItem) -> Self {
        Self {
            entry_id: item.entry_id,
            entry_type: item.entry_type,
            title: item.title,
        }
    }
}

/// Body and metadata fetched for a new entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDetail {
    pub html_content: String,
    pub plain_content: String,
    pub author: String,
    pub publish_time: String,
}

impl From<UrlInfo> for ItemDetail {
    fn from(info: UrlInfo) -> Self {
        Self {
            html_content: info.html_content,
            plain_content: info.content,
            author: info.author,
            publish_time: info.publish_time,
        }
    }
}

/// Fully fetched feed item. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub entry_id: String,
    pub entry_type: i64,
    pub title: String,
    pub html_content: String,
    pub plain_content: String,
    pub author: String,
    pub publish_time: String,
}

impl FeedItem {
    pub fn new(entry: FeedEntry, entry_type: i64, detail: ItemDetail) -> Self {
        Self {
            entry_id: entry.entry_id,
            entry_type,
            title: entry.title,
            html_content: detail.html_content,
            plain_content: detail.plain_content,
            author: detail.author,
            publish_time: detail.publish_time,
        }
    }

    /// Body sent for enrichment: HTML when present, plain text otherwise.
    pub fn content(&self) -> &str {
        if self.html_content.is_empty() {
            &self.plain_content
        } else {
            &self.html_content
        }
    }
}

/// Per-source filter parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub channel_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Empty string requests the first page.
    pub cursor: String,
    pub sort_type: i64,
    pub page_size: u32,
    pub channel_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<FeedEntry>,
    /// Empty string means there is no further page.
    pub next_cursor: String,
}
