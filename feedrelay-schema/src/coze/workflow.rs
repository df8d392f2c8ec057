use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Request body for `POST /v1/workflow/run`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WorkflowRunRequest {
    pub workflow_id: String,
    pub parameters: BTreeMap<String, String>,
}

/// Workflow run response. Success and failure share the envelope; `code == 0` is success.
#[derive(Debug, Deserialize, Serialize)]
pub struct WorkflowRunResponse {
    pub code: i64,

    #[serde(default)]
    pub msg: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute_id: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_url: Option<String>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl WorkflowRunResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}
