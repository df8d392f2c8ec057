use serde::{Deserialize, Serialize};

/// Standard Cloudflare v4 API envelope.
#[derive(Debug, Deserialize, Serialize)]
pub struct CfEnvelope<T> {
    pub success: bool,

    #[serde(default)]
    pub errors: Vec<CfMessage>,

    pub result: Option<T>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CfMessage {
    #[serde(default)]
    pub code: i64,

    #[serde(default)]
    pub message: String,
}

impl<T> CfEnvelope<T> {
    /// Joins error messages for logging (`code: message; ...`).
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
