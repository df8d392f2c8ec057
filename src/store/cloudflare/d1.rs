use super::CloudflareApi;
use crate::error::RelayError;
use crate::http::body_preview;
use crate::store::DedupLedger;
use async_trait::async_trait;
use feedrelay_schema::{CfEnvelope, D1QueryRequest, D1QueryResult};
use tracing::warn;

const SELECT_PROCESSED: &str = "SELECT id FROM processed_articles WHERE id = ?1";
const INSERT_PROCESSED: &str = "INSERT OR IGNORE INTO processed_articles (id) VALUES (?1)";

/// D1 database holding the `processed_articles` ledger table.
pub struct D1Ledger {
    api: CloudflareApi,
    database_id: String,
}

impl D1Ledger {
    pub fn new(api: CloudflareApi, database_id: &str) -> Self {
        Self {
            api,
            database_id: database_id.to_string(),
        }
    }

    async fn query(&self, sql: &str, params: Vec<String>) -> Result<Vec<D1QueryResult>, RelayError> {
        let url = self
            .api
            .account_url(&["d1", "database", &self.database_id, "query"])?;
        let body = D1QueryRequest {
            sql: sql.to_string(),
            params,
        };

        let resp = self
            .api
            .http
            .post(url)
            .bearer_auth(&self.api.api_token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status,
                body: body_preview(resp).await,
            });
        }

        let bytes = resp.bytes().await?;
        let envelope: CfEnvelope<Vec<D1QueryResult>> = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::MalformedResponse(format!("D1 query envelope: {e}")))?;

        if !envelope.success {
            let summary = envelope.error_summary();
            warn!(sql, errors = %summary, "D1 query failed");
            return Err(RelayError::TransientRequest(format!("D1 query failed: {summary}")));
        }

        Ok(envelope.result.unwrap_or_default())
    }
}

#[async_trait]
impl DedupLedger for D1Ledger {
    async fn exists(&self, id: &str) -> Result<bool, RelayError> {
        let results = self.query(SELECT_PROCESSED, vec![id.to_string()]).await?;
        Ok(results.first().is_some_and(|r| !r.results.is_empty()))
    }

    async fn insert(&self, id: &str) -> Result<(), RelayError> {
        self.query(INSERT_PROCESSED, vec![id.to_string()]).await?;
        Ok(())
    }
}
