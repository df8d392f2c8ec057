use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local SQLite file at `basic.database_url`.
    #[default]
    Sqlite,
    /// Cloudflare Workers KV for secrets, D1 for the ledger.
    Cloudflare,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    /// TOML: `store.backend`. One of `sqlite`, `cloudflare`. Default: `sqlite`.
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default)]
    pub cloudflare: CloudflareConfig,
}

/// Cloudflare account settings, only read when `store.backend = "cloudflare"`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudflareConfig {
    /// TOML: `store.cloudflare.api_base`. Default: `https://api.cloudflare.com/client/v4/`.
    #[serde(default = "default_api_base")]
    pub api_base: Url,

    #[serde(default)]
    pub account_id: String,

    /// Bearer token with KV read/write and D1 query permissions.
    #[serde(default)]
    pub api_token: String,

    #[serde(default)]
    pub kv_namespace_id: String,

    #[serde(default)]
    pub d1_database_id: String,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            account_id: String::new(),
            api_token: String::new(),
            kv_namespace_id: String::new(),
            d1_database_id: String::new(),
        }
    }
}

impl CloudflareConfig {
    pub(crate) fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("store.cloudflare.account_id", &self.account_id),
            ("store.cloudflare.api_token", &self.api_token),
            ("store.cloudflare.kv_namespace_id", &self.kv_namespace_id),
            ("store.cloudflare.d1_database_id", &self.d1_database_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

fn default_api_base() -> Url {
    Url::parse("https://api.cloudflare.com/client/v4/").expect("valid Cloudflare API base URL")
}
