use reqwest::StatusCode;
use thiserror::Error as ThisError;

/// Failure of a single enrichment (workflow run) call.
#[derive(Debug, ThisError)]
pub enum WorkflowError {
    /// Transport-level failure (DNS, connect, timeouts, etc).
    #[error("Workflow request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Workflow upstream status {status}: {body:.200}")]
    UpstreamStatus { status: StatusCode, body: String },

    /// Well-formed envelope with a non-zero domain code.
    #[error("Workflow API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Workflow response parse error: {0}")]
    Parse(String),
}

impl WorkflowError {
    pub fn is_auth_failure(&self) -> bool {
        crate::dispatch::classify::is_auth_failure(self)
    }
}
