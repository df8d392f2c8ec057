use super::{FeedEntry, ItemDetail};
use crate::error::RelayError;
use crate::http::body_preview;
use crate::store::CredentialStore;
use async_trait::async_trait;
use feedrelay_schema::EntryDetailResponse;
use feedrelay_schema::lingowhale::{CODE_CREDENTIAL_INVALID, CODE_OK};
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Credential-store keys for the feed session, paired with the header each one fills.
pub const SESSION_HEADER_KEYS: [(&str, &str); 4] = [
    ("access-token", "LINGOWHALE_ACCESS_TOKEN"),
    ("auth-token", "LINGOWHALE_AUTH_TOKEN"),
    ("b-id", "LINGOWHALE_B_ID"),
    ("guest-id", "LINGOWHALE_GUEST_ID"),
];

/// Per-item body lookup.
///
/// A rejected session must surface as [`RelayError::SourceCredentialInvalid`].
#[async_trait]
pub trait ItemDetailSource: Send + Sync {
    async fn fetch_detail(&self, entry: &FeedEntry, entry_type: i64)
    -> Result<ItemDetail, RelayError>;
}

/// LingoWhale entry detail endpoint; session headers are read from the credential store per call.
pub struct LingoDetailClient {
    http: reqwest::Client,
    url: Url,
    store: Arc<dyn CredentialStore>,
}

impl LingoDetailClient {
    pub fn new(url: Url, store: Arc<dyn CredentialStore>, http: reqwest::Client) -> Self {
        Self { http, url, store }
    }

    async fn session_headers(&self) -> Result<Vec<(&'static str, String)>, RelayError> {
        let mut headers = Vec::with_capacity(SESSION_HEADER_KEYS.len());
        for (header, key) in SESSION_HEADER_KEYS {
            let value = self.store.get(key).await?.unwrap_or_default();
            headers.push((header, value.trim().to_string()));
        }
        Ok(headers)
    }
}

#[async_trait]
impl ItemDetailSource for LingoDetailClient {
    async fn fetch_detail(
        &self,
        entry: &FeedEntry,
        entry_type: i64,
    ) -> Result<ItemDetail, RelayError> {
        let mut req = self.http.get(self.url.clone()).query(&[
            ("entry_id", entry.entry_id.clone()),
            ("entry_type", entry_type.to_string()),
        ]);
        for (header, value) in self.session_headers().await? {
            req = req.header(header, value);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status,
                body: body_preview(resp).await,
            });
        }

        let bytes = resp.bytes().await?;
        let parsed: EntryDetailResponse = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::MalformedResponse(format!("entry detail: {e}")))?;

        match parsed.code {
            CODE_OK => Ok(parsed.data.unwrap_or_default().url_info.into()),
            CODE_CREDENTIAL_INVALID => Err(RelayError::SourceCredentialInvalid {
                code: parsed.code,
                message: parsed.msg.unwrap_or_default(),
            }),
            code => {
                let msg = parsed.msg.unwrap_or_default();
                warn!(entry_id = %entry.entry_id, code, msg = %msg, "Entry detail API returned an error");
                Err(RelayError::TransientRequest(format!(
                    "entry detail API error {code}: {msg}"
                )))
            }
        }
    }
}
