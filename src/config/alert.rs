use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlertConfig {
    /// Feishu custom-bot webhook. When unset, alerts are only logged.
    /// TOML: `alert.feishu_webhook_url`.
    #[serde(default)]
    pub feishu_webhook_url: Option<Url>,
}
