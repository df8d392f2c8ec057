use crate::error::{RelayError, WorkflowError};
use crate::http::UPSTREAM_BODY_PREVIEW_CHARS;
use crate::token::Credential;
use async_trait::async_trait;
use feedrelay_schema::{WorkflowRunRequest, WorkflowRunResponse};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Identifiers returned by a successful workflow run, kept for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowReceipt {
    pub execute_id: Option<String>,
}

/// External enrichment endpoint.
#[async_trait]
pub trait WorkflowEndpoint: Send + Sync {
    async fn run(
        &self,
        credential: &Credential,
        parameters: &BTreeMap<String, String>,
    ) -> Result<WorkflowReceipt, WorkflowError>;
}

/// Coze workflow runner (`POST /v1/workflow/run`).
pub struct CozeWorkflowClient {
    http: reqwest::Client,
    run_url: Url,
    workflow_id: String,
}

impl CozeWorkflowClient {
    pub fn new(api_base: &Url, workflow_id: &str, http: reqwest::Client) -> Result<Self, RelayError> {
        Ok(Self {
            http,
            run_url: api_base.join("v1/workflow/run")?,
            workflow_id: workflow_id.to_string(),
        })
    }
}

#[async_trait]
impl WorkflowEndpoint for CozeWorkflowClient {
    async fn run(
        &self,
        credential: &Credential,
        parameters: &BTreeMap<String, String>,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let body = WorkflowRunRequest {
            workflow_id: self.workflow_id.clone(),
            parameters: parameters.clone(),
        };

        let resp = self
            .http
            .post(self.run_url.clone())
            .bearer_auth(credential.access_token())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let raw = String::from_utf8_lossy(&bytes);
            return Err(WorkflowError::UpstreamStatus {
                status,
                body: format!("{:.len$}", raw, len = UPSTREAM_BODY_PREVIEW_CHARS),
            });
        }

        let parsed: WorkflowRunResponse =
            serde_json::from_slice(&bytes).map_err(|e| WorkflowError::Parse(e.to_string()))?;
        if !parsed.is_success() {
            return Err(WorkflowError::Api {
                code: parsed.code,
                message: parsed.msg,
            });
        }

        debug!(execute_id = ?parsed.execute_id, "Workflow run accepted");
        Ok(WorkflowReceipt {
            execute_id: parsed.execute_id,
        })
    }
}
