//! Refresh-token rotation.
//!
//! - `authority.rs`: the OAuth refresh grant (one exchange consumes the stored refresh token)
//! - `lock.rs`: host-wide mutual exclusion around a rotation
//! - `manager.rs`: [`TokenManager`], the only owner of the current access credential

mod authority;
mod credential;
mod lock;
mod manager;

pub use authority::{OauthTokenAuthority, TokenAuthority, TokenPair};
pub use credential::Credential;
pub use lock::{FileRotationLock, LocalRotationLock, RotationGuard, RotationLock};
pub use manager::TokenManager;

use crate::config::{LockBackend, TokenConfig};
use std::sync::Arc;
use std::time::Duration;

pub fn lock_from_config(cfg: &TokenConfig) -> Arc<dyn RotationLock> {
    let timeout = Duration::from_secs(cfg.lock_timeout_secs);
    match cfg.lock {
        LockBackend::File => Arc::new(FileRotationLock::new(cfg.lock_path.clone(), timeout)),
        LockBackend::Local => Arc::new(LocalRotationLock::new(timeout)),
    }
}
