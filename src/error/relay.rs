use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error as ThisError;

use super::oauth::OauthError;
use super::workflow::WorkflowError;

#[derive(Debug, ThisError)]
pub enum RelayError {
    /// Operator setup problem (missing seed token, missing config). Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timed out after {waited:?} waiting for rotation lock {lock}")]
    LockTimeout { lock: String, waited: Duration },

    /// Credential rejected by an upstream; the observing call site decides whether to rotate.
    #[error("Authentication failure: {0}")]
    AuthFailure(String),

    #[error("Transient request error: {0}")]
    TransientRequest(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Upstream error with status: {status}")]
    UpstreamStatus { status: StatusCode, body: String },

    /// The feed source reported its session headers as invalid.
    #[error("Source credential invalid (code {code}): {message}")]
    SourceCredentialInvalid { code: i64, message: String },

    #[error(transparent)]
    Oauth(#[from] OauthError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    /// A forced rotation already failed earlier in this run.
    #[error("Token rotation already failed this run: {0}")]
    RotationFailed(String),

    #[error("Dispatcher queue is closed")]
    DispatcherClosed,
}

impl RelayError {
    /// Errors that must halt the whole run rather than a single walk or job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RelayError::Configuration(_) | RelayError::LockTimeout { .. }
        )
    }

    /// Undecodable upstream payloads are handled like any other transient failure.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RelayError::TransientRequest(_)
                | RelayError::MalformedResponse(_)
                | RelayError::UpstreamStatus { .. }
                | RelayError::ReqwestError(_)
                | RelayError::JsonError(_)
                | RelayError::DatabaseError(_)
        )
    }
}
