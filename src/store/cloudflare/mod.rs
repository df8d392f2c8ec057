//! Cloudflare-hosted store backends: Workers KV for secrets, D1 for the ledger.

mod d1;
mod kv;

pub use d1::D1Ledger;
pub use kv::KvCredentialStore;

use crate::config::CloudflareConfig;
use crate::error::RelayError;
use url::Url;

/// Shared account context for the Cloudflare v4 REST API.
#[derive(Clone)]
pub struct CloudflareApi {
    http: reqwest::Client,
    api_base: Url,
    account_id: String,
    api_token: String,
}

impl CloudflareApi {
    pub fn new(cfg: &CloudflareConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            api_base: cfg.api_base.clone(),
            account_id: cfg.account_id.clone(),
            api_token: cfg.api_token.clone(),
        }
    }

    /// `{api_base}/accounts/{account_id}/<segments...>` with each segment percent-encoded.
    fn account_url(&self, segments: &[&str]) -> Result<Url, RelayError> {
        let mut url = self.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                RelayError::Configuration(format!(
                    "store.cloudflare.api_base cannot be a base URL: {}",
                    self.api_base
                ))
            })?;
            path.pop_if_empty().push("accounts").push(&self.account_id);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }
}
