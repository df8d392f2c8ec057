use crate::error::RelayError;
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Proof of holding the rotation lock; released on drop.
pub struct RotationGuard {
    _inner: Box<dyn Send>,
}

impl RotationGuard {
    pub fn new<T: Send + 'static>(inner: T) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }
}

/// Named exclusive lock serialising refresh-token rotations.
///
/// Acquisition is bounded; running out of time is a [`RelayError::LockTimeout`].
#[async_trait]
pub trait RotationLock: Send + Sync {
    async fn acquire(&self) -> Result<RotationGuard, RelayError>;

    /// Human-readable lock name for logs and errors.
    fn name(&self) -> String;
}

/// Advisory `flock`-style lock on a file, shared by every process on the host.
pub struct FileRotationLock {
    path: PathBuf,
    timeout: Duration,
}

impl FileRotationLock {
    pub fn new(path: PathBuf, timeout: Duration) -> Self {
        Self { path, timeout }
    }
}

/// One non-blocking attempt; `Ok(None)` means another holder has the lock.
fn try_lock_file(path: &Path) -> Result<Option<File>, RelayError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(file)),
        Err(e)
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
                || e.kind() == std::io::ErrorKind::WouldBlock =>
        {
            Ok(None)
        }
        Err(e) => Err(RelayError::IoError(e)),
    }
}

struct FileLockHold(File);

impl Drop for FileLockHold {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.0) {
            warn!(error = %e, "Failed to release rotation file lock; closing descriptor instead");
        }
    }
}

#[async_trait]
impl RotationLock for FileRotationLock {
    async fn acquire(&self) -> Result<RotationGuard, RelayError> {
        let started = Instant::now();

        loop {
            let path = self.path.clone();
            let attempt = tokio::task::spawn_blocking(move || try_lock_file(&path))
                .await
                .map_err(|e| RelayError::IoError(std::io::Error::other(e)))??;

            if let Some(file) = attempt {
                debug!(lock = %self.path.display(), waited = ?started.elapsed(), "Rotation lock acquired");
                return Ok(RotationGuard::new(FileLockHold(file)));
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(RelayError::LockTimeout {
                    lock: self.name(),
                    waited,
                });
            }
            tokio::time::sleep(LOCK_POLL_INTERVAL.min(self.timeout - waited)).await;
        }
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process lock for single-instance deployments.
pub struct LocalRotationLock {
    mutex: Arc<Mutex<()>>,
    timeout: Duration,
}

impl LocalRotationLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            mutex: Arc::new(Mutex::new(())),
            timeout,
        }
    }
}

#[async_trait]
impl RotationLock for LocalRotationLock {
    async fn acquire(&self) -> Result<RotationGuard, RelayError> {
        let started = Instant::now();
        match tokio::time::timeout(self.timeout, self.mutex.clone().lock_owned()).await {
            Ok(guard) => Ok(RotationGuard::new(guard)),
            Err(_) => Err(RelayError::LockTimeout {
                lock: self.name(),
                waited: started.elapsed(),
            }),
        }
    }

    fn name(&self) -> String {
        "local-rotation-lock".to_string()
    }
}
