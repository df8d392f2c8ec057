//! Durable collaborators: the credential store and the dedup ledger.
//!
//! Both are trait objects so the pipeline can run against SQLite, Cloudflare, or
//! test doubles without caring which.

pub mod cloudflare;
mod sqlite;

use crate::config::{Config, StoreBackend};
use crate::error::RelayError;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable key -> string store. Holds the live refresh token and feed-source session headers.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, RelayError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), RelayError>;
}

/// Durable set of processed entry ids.
///
/// `insert` must tolerate an id that is already present.
#[async_trait]
pub trait DedupLedger: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool, RelayError>;

    async fn insert(&self, id: &str) -> Result<(), RelayError>;
}

#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialStore>,
    pub ledger: Arc<dyn DedupLedger>,
}

impl Stores {
    /// Builds the configured backend pair.
    pub async fn from_config(cfg: &Config, http: reqwest::Client) -> Result<Self, RelayError> {
        match cfg.store.backend {
            StoreBackend::Sqlite => {
                let db = crate::db::spawn(&cfg.basic.database_url).await?;
                Ok(Self {
                    credentials: Arc::new(db.clone()),
                    ledger: Arc::new(db),
                })
            }
            StoreBackend::Cloudflare => {
                let api = cloudflare::CloudflareApi::new(&cfg.store.cloudflare, http);
                Ok(Self {
                    credentials: Arc::new(cloudflare::KvCredentialStore::new(
                        api.clone(),
                        &cfg.store.cloudflare.kv_namespace_id,
                    )),
                    ledger: Arc::new(cloudflare::D1Ledger::new(
                        api,
                        &cfg.store.cloudflare.d1_database_id,
                    )),
                })
            }
        }
    }
}
