mod alert;
mod basic;
mod feed;
mod sources;
mod store;
mod token;
mod workflow;

pub use alert::AlertConfig;
pub use basic::BasicConfig;
pub use feed::FeedConfig;
pub use sources::SourceConfig;
pub use store::{CloudflareConfig, StoreBackend, StoreConfig};
pub use token::{LockBackend, TokenConfig};
pub use workflow::WorkflowConfig;

use crate::error::RelayError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Logging, database and HTTP client settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Where the refresh token and the dedup ledger live.
    #[serde(default)]
    pub store: StoreConfig,

    /// Refresh-token rotation settings.
    #[serde(default)]
    pub token: TokenConfig,

    /// Feed and item-detail endpoints.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Enrichment workflow endpoint and dispatcher sizing.
    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub alert: AlertConfig,

    /// Feed sources walked in order on every run (`[[sources]]` in config.toml).
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "FEEDRELAY_";

impl Config {
    /// Builds a Figment that merges defaults, an optional TOML file, and `FEEDRELAY_*` env vars.
    ///
    /// Nested keys use `__` as separator, e.g. `FEEDRELAY_TOKEN__CLIENT_SECRET`.
    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if path.is_file() {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates configuration.
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let cfg: Self = Self::figment(path).extract().map_err(|err| {
            RelayError::Configuration(format!(
                "failed to extract configuration from {}: {err}",
                path.display()
            ))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects configurations that cannot possibly complete a run.
    pub fn validate(&self) -> Result<(), RelayError> {
        let mut missing = Vec::new();
        if self.token.client_id.trim().is_empty() {
            missing.push("token.client_id");
        }
        if self.workflow.workflow_id.trim().is_empty() {
            missing.push("workflow.workflow_id");
        }
        if self.store.backend == StoreBackend::Cloudflare {
            missing.extend(self.store.cloudflare.missing_fields());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RelayError::Configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            )))
        }
    }
}
