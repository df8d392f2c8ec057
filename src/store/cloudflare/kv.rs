use super::CloudflareApi;
use crate::error::RelayError;
use crate::http::body_preview;
use crate::store::CredentialStore;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Workers KV namespace used as the credential store.
pub struct KvCredentialStore {
    api: CloudflareApi,
    namespace_id: String,
}

impl KvCredentialStore {
    pub fn new(api: CloudflareApi, namespace_id: &str) -> Self {
        Self {
            api,
            namespace_id: namespace_id.to_string(),
        }
    }

    fn value_url(&self, key: &str) -> Result<url::Url, RelayError> {
        self.api.account_url(&[
            "storage",
            "kv",
            "namespaces",
            &self.namespace_id,
            "values",
            key,
        ])
    }
}

#[async_trait]
impl CredentialStore for KvCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RelayError> {
        let resp = self
            .api
            .http
            .get(self.value_url(key)?)
            .bearer_auth(&self.api.api_token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => Ok(Some(resp.text().await?)),
            StatusCode::NOT_FOUND => {
                debug!(key, "KV key not found");
                Ok(None)
            }
            status => Err(RelayError::UpstreamStatus {
                status,
                body: body_preview(resp).await,
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RelayError> {
        let resp = self
            .api
            .http
            .put(self.value_url(key)?)
            .bearer_auth(&self.api.api_token)
            .body(value.to_string())
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RelayError::UpstreamStatus {
                status,
                body: body_preview(resp).await,
            })
        }
    }
}
