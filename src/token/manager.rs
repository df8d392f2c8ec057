use super::{Credential, RotationLock, TokenAuthority};
use crate::alert::AlertSink;
use crate::error::RelayError;
use crate::store::CredentialStore;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

const ROTATION_FAILED_TITLE: &str = "Refresh token rotation failed";

/// Outcome of the first forced rotation of a run. Later forced rotations replay it.
enum ForcedRotation {
    Rotated,
    Failed(RelayError),
}

#[derive(Default)]
struct TokenState {
    forced: Option<ForcedRotation>,
}

/// Owns the current access credential for one run.
///
/// Rotations are serialised twice: by `state` within the process, and by the
/// [`RotationLock`] across processes sharing the same credential store. A refresh token is
/// single-use, so two overlapping exchanges would burn the seed.
///
/// The latest credential is published on a `watch` channel so readers never queue behind
/// a rotation in progress.
pub struct TokenManager {
    store: Arc<dyn CredentialStore>,
    authority: Arc<dyn TokenAuthority>,
    lock: Arc<dyn RotationLock>,
    alerts: Arc<dyn AlertSink>,
    refresh_token_key: String,
    state: Mutex<TokenState>,
    current: watch::Sender<Option<Credential>>,
    exchanges: AtomicU64,
}

impl TokenManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        authority: Arc<dyn TokenAuthority>,
        lock: Arc<dyn RotationLock>,
        alerts: Arc<dyn AlertSink>,
        refresh_token_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            authority,
            lock,
            alerts,
            refresh_token_key: refresh_token_key.into(),
            state: Mutex::new(TokenState::default()),
            current: watch::Sender::new(None),
            exchanges: AtomicU64::new(0),
        }
    }

    /// Latest issued credential, without waiting on a rotation in progress.
    pub fn cached_credential(&self) -> Option<Credential> {
        self.current.borrow().clone()
    }

    /// Returns a usable credential, rotating on first use.
    pub async fn current_credential(&self) -> Result<Credential, RelayError> {
        if let Some(cred) = self.cached_credential() {
            return Ok(cred);
        }

        let _state = self.state.lock().await;
        if let Some(cred) = self.cached_credential() {
            return Ok(cred);
        }

        let cred = self.rotate().await?;
        self.current.send_replace(Some(cred.clone()));
        Ok(cred)
    }

    /// Rotates after an auth failure, at most once per run.
    ///
    /// Only the first caller talks to the authority. Everyone after it, including callers
    /// queued behind it, gets the same outcome: the rotated credential, or the same error
    /// without another exchange or alert.
    pub async fn force_rotate(&self) -> Result<Credential, RelayError> {
        let mut state = self.state.lock().await;
        match state.forced.as_ref() {
            Some(ForcedRotation::Rotated) => {
                if let Some(cred) = self.cached_credential() {
                    info!("Forced rotation already done this run; reusing credential");
                    return Ok(cred);
                }
            }
            Some(ForcedRotation::Failed(e)) => {
                debug!(error = %e, "Forced rotation already failed this run");
                return Err(replay(e));
            }
            None => {}
        }

        match self.rotate().await {
            Ok(cred) => {
                self.current.send_replace(Some(cred.clone()));
                state.forced = Some(ForcedRotation::Rotated);
                Ok(cred)
            }
            Err(e) => {
                state.forced = Some(ForcedRotation::Failed(replay(&e)));
                Err(e)
            }
        }
    }

    /// Number of authority-side exchanges performed by this manager.
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    async fn rotate(&self) -> Result<Credential, RelayError> {
        self.rotate_inner().await.inspect_err(|e| {
            error!(error = %e, "Refresh token rotation failed");
            self.alerts.notify(
                ROTATION_FAILED_TITLE,
                &format!(
                    "**Key**: {}\n**Error**: {}\n**Action**: check the stored refresh token and re-authorize if needed",
                    self.refresh_token_key, e
                ),
            );
        })
    }

    async fn rotate_inner(&self) -> Result<Credential, RelayError> {
        let _guard = self.lock.acquire().await?;

        let seed = self
            .store
            .get(&self.refresh_token_key)
            .await?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                RelayError::Configuration(format!(
                    "refresh token `{}` not found in credential store; seed it before running",
                    self.refresh_token_key
                ))
            })?;

        self.exchanges.fetch_add(1, Ordering::Relaxed);
        let pair = self.authority.exchange(&seed).await?;

        // The old seed is already dead; the new one must be durable before the access token
        // is handed out.
        if let Err(e) = self.store.set(&self.refresh_token_key, &pair.refresh_token).await {
            warn!(
                key = %self.refresh_token_key,
                error = %e,
                "Rotated refresh token could not be persisted"
            );
            return Err(e);
        }

        info!(key = %self.refresh_token_key, "Refresh token rotated and persisted");
        Ok(Credential::new(pair.access_token, Utc::now()))
    }
}

/// Copy of a recorded rotation failure. Fatal kinds keep their variant so callers still halt.
fn replay(e: &RelayError) -> RelayError {
    match e {
        RelayError::Configuration(message) => RelayError::Configuration(message.clone()),
        RelayError::LockTimeout { lock, waited } => RelayError::LockTimeout {
            lock: lock.clone(),
            waited: *waited,
        },
        RelayError::RotationFailed(message) => RelayError::RotationFailed(message.clone()),
        other => RelayError::RotationFailed(other.to_string()),
    }
}
