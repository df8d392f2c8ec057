use super::{FeedEntry, FeedPage, PageRequest};
use crate::error::RelayError;
use crate::http::body_preview;
use crate::utils::logging::with_pretty_json_debug;
use async_trait::async_trait;
use feedrelay_schema::lingowhale::CODE_OK;
use feedrelay_schema::{FeedSubscriptionRequest, FeedSubscriptionResponse};
use url::Url;

/// Paginated, newest-first feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage, RelayError>;
}

/// LingoWhale subscription feed over HTTP.
pub struct LingoFeedClient {
    http: reqwest::Client,
    url: Url,
}

impl LingoFeedClient {
    pub fn new(url: Url, http: reqwest::Client) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl FeedSource for LingoFeedClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage, RelayError> {
        let body = FeedSubscriptionRequest {
            cursor: request.cursor.clone(),
            sort_type: request.sort_type,
            limit: request.page_size,
            filter_unread: false,
            channel_ids: request.channel_ids.clone(),
        };

        let resp = self.http.post(self.url.clone()).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status,
                body: body_preview(resp).await,
            });
        }

        let bytes = resp.bytes().await?;
        let parsed: FeedSubscriptionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::MalformedResponse(format!("feed page: {e}")))?;

        with_pretty_json_debug(&parsed, |pretty| {
            tracing::debug!(cursor = %request.cursor, body = %pretty, "Feed page response");
        });

        if parsed.code != CODE_OK {
            return Err(RelayError::TransientRequest(format!(
                "feed API error {}: {}",
                parsed.code,
                parsed.msg.unwrap_or_default()
            )));
        }

        let data = parsed.data.unwrap_or_default();
        Ok(FeedPage {
            items: data.feed_list.into_iter().map(FeedEntry::from).collect(),
            next_cursor: data.cursor,
        })
    }
}
