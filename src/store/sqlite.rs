use super::{CredentialStore, DedupLedger};
use crate::db::DbActorHandle;
use crate::error::RelayError;
use async_trait::async_trait;

#[async_trait]
impl CredentialStore for DbActorHandle {
    async fn get(&self, key: &str) -> Result<Option<String>, RelayError> {
        self.get_secret(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RelayError> {
        self.set_secret(key, value).await
    }
}

#[async_trait]
impl DedupLedger for DbActorHandle {
    async fn exists(&self, id: &str) -> Result<bool, RelayError> {
        DbActorHandle::exists(self, id).await
    }

    async fn insert(&self, id: &str) -> Result<(), RelayError> {
        DbActorHandle::insert(self, id).await
    }
}
