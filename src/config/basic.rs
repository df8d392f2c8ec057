use serde::{Deserialize, Serialize};
use url::Url;

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// Database URL for the SQLite store backend.
    /// TOML: `basic.database_url`. Default: `sqlite://feedrelay.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Optional upstream HTTP proxy. If set, used for every reqwest client.
    /// TOML: `basic.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Allow HTTP/2 multiplexing for reqwest clients; disabled forces HTTP/1.
    /// TOML: `basic.enable_multiplexing`. Default: `false`.
    #[serde(default)]
    pub enable_multiplexing: bool,

    /// Whole-request timeout for upstream calls, in seconds.
    /// TOML: `basic.request_timeout_secs`. Default: `30`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            loglevel: default_loglevel(),
            database_url: default_database_url(),
            proxy: None,
            enable_multiplexing: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_database_url() -> String {
    "sqlite://feedrelay.db".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}
