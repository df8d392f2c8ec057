use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LockBackend {
    /// Advisory file lock shared by every process on the host.
    #[default]
    File,
    /// In-process mutex only; for deployments that never run two instances at once.
    Local,
}

/// Refresh-token rotation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// OAuth token endpoint used for the refresh-token grant.
    /// TOML: `token.token_url`. Default: `https://api.coze.cn/api/permission/oauth2/token`.
    #[serde(default = "default_token_url")]
    pub token_url: Url,

    /// TOML: `token.client_id`. Required.
    #[serde(default)]
    pub client_id: String,

    /// TOML: `token.client_secret`. Usually supplied via `FEEDRELAY_TOKEN__CLIENT_SECRET`.
    #[serde(default)]
    pub client_secret: String,

    /// Credential-store key holding the live refresh token.
    /// TOML: `token.refresh_token_key`. Default: `COZE_LINGGO_REFRESH_TOKEN`.
    #[serde(default = "default_refresh_token_key")]
    pub refresh_token_key: String,

    /// TOML: `token.lock`. One of `file`, `local`. Default: `file`.
    #[serde(default)]
    pub lock: LockBackend,

    /// Lock file for `token.lock = "file"`.
    /// TOML: `token.lock_path`. Default: `<tmp>/feedrelay-token-rotation.lock`.
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,

    /// Upper bound on waiting for the rotation lock, in seconds.
    /// TOML: `token.lock_timeout_secs`. Default: `30`.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token_key: default_refresh_token_key(),
            lock: LockBackend::default(),
            lock_path: default_lock_path(),
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

fn default_token_url() -> Url {
    Url::parse("https://api.coze.cn/api/permission/oauth2/token").expect("valid Coze token URL")
}

fn default_refresh_token_key() -> String {
    "COZE_LINGGO_REFRESH_TOKEN".to_string()
}

fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join("feedrelay-token-rotation.lock")
}

fn default_lock_timeout_secs() -> u64 {
    30
}
