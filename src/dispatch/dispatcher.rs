use super::job::DispatchJob;
use super::workflow::WorkflowEndpoint;
use crate::alert::AlertSink;
use crate::config::WorkflowConfig;
use crate::error::{RelayError, WorkflowError};
use crate::store::DedupLedger;
use crate::token::{Credential, TokenManager};
use futures::StreamExt;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

const AUTH_REJECTED_TITLE: &str = "Workflow credential rejected after rotation";

/// Pool sizing, taken from `[workflow]`.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherSettings {
    pub concurrency: usize,
    pub queue_capacity: usize,
    pub workflow_tps: Option<u32>,
}

impl From<&WorkflowConfig> for DispatcherSettings {
    fn from(cfg: &WorkflowConfig) -> Self {
        Self {
            concurrency: cfg.concurrency,
            queue_capacity: cfg.queue_capacity,
            workflow_tps: cfg.workflow_tps,
        }
    }
}

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Enriched and recorded in the ledger.
    Completed { entry_id: String },
    /// Nothing to send; the endpoint was not called.
    Skipped { entry_id: String },
    /// Enrichment failed; the item stays unrecorded and is retried next run.
    Dropped { entry_id: String, reason: String },
    /// Enriched, but the ledger insert failed, so the item may be enriched again.
    Unrecorded { entry_id: String },
    /// Discarded by a non-draining shutdown before it started.
    Abandoned { entry_id: String },
}

/// Counters for one dispatcher lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub submitted: usize,
    pub completed: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub unrecorded: usize,
    pub abandoned: usize,
    /// Forced rotations that failed with a run-halting error.
    pub fatal_rotations: usize,
}

impl DispatchReport {
    /// Jobs that reached a terminal state.
    pub fn finished(&self) -> usize {
        self.completed + self.skipped + self.dropped + self.unrecorded + self.abandoned
    }
}

#[derive(Default)]
struct DispatchStats {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    dropped: AtomicUsize,
    unrecorded: AtomicUsize,
    abandoned: AtomicUsize,
    fatal_rotations: AtomicUsize,
}

impl DispatchStats {
    fn record(&self, outcome: &JobOutcome) {
        let counter = match outcome {
            JobOutcome::Completed { .. } => &self.completed,
            JobOutcome::Skipped { .. } => &self.skipped,
            JobOutcome::Dropped { .. } => &self.dropped,
            JobOutcome::Unrecorded { .. } => &self.unrecorded,
            JobOutcome::Abandoned { .. } => &self.abandoned,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DispatchReport {
        DispatchReport {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            unrecorded: self.unrecorded.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            fatal_rotations: self.fatal_rotations.load(Ordering::Relaxed),
        }
    }
}

struct QueuedJob {
    job: DispatchJob,
    credential: Credential,
}

struct JobWorker {
    endpoint: Arc<dyn WorkflowEndpoint>,
    tokens: Arc<TokenManager>,
    ledger: Arc<dyn DedupLedger>,
    alerts: Arc<dyn AlertSink>,
    limiter: Option<DefaultDirectRateLimiter>,
    abandon: Arc<AtomicBool>,
    auth_alerted: AtomicBool,
    stats: Arc<DispatchStats>,
}

impl JobWorker {
    async fn execute(&self, queued: QueuedJob) -> JobOutcome {
        let QueuedJob { job, credential } = queued;
        let entry_id = job.entry_id.clone();

        if self.abandon.load(Ordering::Acquire) {
            debug!(entry_id = %entry_id, "Dispatcher stopping; job abandoned");
            return JobOutcome::Abandoned { entry_id };
        }

        let parameters = job.parameters();
        if parameters.is_empty() {
            info!(entry_id = %entry_id, "All workflow parameters empty; skipping call");
            return JobOutcome::Skipped { entry_id };
        }

        if let Some(limiter) = self.limiter.as_ref() {
            limiter.until_ready().await;
        }

        let first = self.endpoint.run(&credential, &parameters).await;
        let err = match first {
            Ok(receipt) => {
                debug!(entry_id = %entry_id, execute_id = ?receipt.execute_id, "Workflow call succeeded");
                return self.record(entry_id).await;
            }
            Err(e) => e,
        };

        if !err.is_auth_failure() {
            return self.drop_job(entry_id, &err);
        }

        warn!(entry_id = %entry_id, error = %err, "Workflow rejected credential; forcing rotation");
        let fresh = match self.tokens.force_rotate().await {
            Ok(cred) => cred,
            Err(e) => {
                if e.is_fatal() {
                    self.stats.fatal_rotations.fetch_add(1, Ordering::Relaxed);
                }
                error!(entry_id = %entry_id, error = %e, "Forced rotation failed; dropping job");
                return JobOutcome::Dropped {
                    entry_id,
                    reason: e.to_string(),
                };
            }
        };

        if let Some(limiter) = self.limiter.as_ref() {
            limiter.until_ready().await;
        }

        match self.endpoint.run(&fresh, &parameters).await {
            Ok(receipt) => {
                debug!(entry_id = %entry_id, execute_id = ?receipt.execute_id, "Workflow retry succeeded");
                self.record(entry_id).await
            }
            Err(e) if e.is_auth_failure() => self.reject_after_rotation(entry_id, &e),
            Err(e) => self.drop_job(entry_id, &e),
        }
    }

    /// The fresh credential was refused too; one alert per dispatcher.
    fn reject_after_rotation(&self, entry_id: String, err: &WorkflowError) -> JobOutcome {
        let err = RelayError::AuthFailure(err.to_string());
        error!(entry_id = %entry_id, error = %err, "Workflow rejected the rotated credential; dropping job");
        if !self.auth_alerted.swap(true, Ordering::AcqRel) {
            self.alerts.notify(
                AUTH_REJECTED_TITLE,
                &format!(
                    "**Entry**: {entry_id}\n**Error**: {err}\n**Action**: check the workflow app authorization"
                ),
            );
        }
        JobOutcome::Dropped {
            entry_id,
            reason: err.to_string(),
        }
    }

    async fn record(&self, entry_id: String) -> JobOutcome {
        match self.ledger.insert(&entry_id).await {
            Ok(()) => JobOutcome::Completed { entry_id },
            Err(e) => {
                error!(entry_id = %entry_id, error = %e, "Enriched item could not be recorded in ledger");
                JobOutcome::Unrecorded { entry_id }
            }
        }
    }

    fn drop_job(&self, entry_id: String, err: &WorkflowError) -> JobOutcome {
        warn!(entry_id = %entry_id, error = %err, "Workflow call failed; dropping job");
        JobOutcome::Dropped {
            entry_id,
            reason: err.to_string(),
        }
    }
}

/// Bounded worker pool calling the enrichment endpoint.
///
/// Jobs carry the credential current at submit time. An auth failure forces one rotation
/// and one retry with the fresh credential; the item is recorded in the ledger only after
/// a successful call.
pub struct Dispatcher {
    job_tx: mpsc::Sender<QueuedJob>,
    tokens: Arc<TokenManager>,
    stats: Arc<DispatchStats>,
    abandon: Arc<AtomicBool>,
    pipeline: JoinHandle<()>,
}

impl Dispatcher {
    pub fn spawn(
        settings: DispatcherSettings,
        endpoint: Arc<dyn WorkflowEndpoint>,
        tokens: Arc<TokenManager>,
        ledger: Arc<dyn DedupLedger>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let concurrency = settings.concurrency.max(1);
        let limiter = settings
            .workflow_tps
            .and_then(NonZeroU32::new)
            .map(|tps| RateLimiter::direct(Quota::per_second(tps)));
        let stats = Arc::new(DispatchStats::default());
        let abandon = Arc::new(AtomicBool::new(false));

        let worker = Arc::new(JobWorker {
            endpoint,
            tokens: tokens.clone(),
            ledger,
            alerts,
            limiter,
            abandon: abandon.clone(),
            auth_alerted: AtomicBool::new(false),
            stats: stats.clone(),
        });

        let (job_tx, job_rx) = mpsc::channel::<QueuedJob>(settings.queue_capacity.max(1));
        let pipeline_stats = stats.clone();

        let pipeline = tokio::spawn(async move {
            info!(
                "Dispatch Pipeline Started: BufferUnordered={}, RateLimit={}",
                concurrency,
                settings
                    .workflow_tps
                    .map(|t| format!("{t}/s"))
                    .unwrap_or_else(|| "none".to_string())
            );

            let mut pipeline = ReceiverStream::new(job_rx)
                .map(|queued| {
                    let worker = worker.clone();
                    let entry_id = queued.job.entry_id.clone();
                    async move {
                        // Each job runs in its own task so a panic stays contained to that job.
                        match tokio::spawn(async move { worker.execute(queued).await }).await {
                            Ok(outcome) => outcome,
                            Err(e) => JobOutcome::Dropped {
                                entry_id,
                                reason: format!("job task failed: {e}"),
                            },
                        }
                    }
                })
                .buffer_unordered(concurrency);

            while let Some(outcome) = pipeline.next().await {
                pipeline_stats.record(&outcome);
            }

            info!("Dispatch Pipeline Stopped");
        });

        Self {
            job_tx,
            tokens,
            stats,
            abandon,
            pipeline,
        }
    }

    /// Queues a job with a snapshot of the current credential.
    ///
    /// Waits while the queue is full, but not on a rotation in progress once a credential
    /// has been issued. A stale snapshot costs the job one retry.
    pub async fn submit(&self, job: DispatchJob) -> Result<(), RelayError> {
        let credential = self.tokens.current_credential().await?;
        self.job_tx
            .send(QueuedJob { job, credential })
            .await
            .map_err(|_| RelayError::DispatcherClosed)?;
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Stops accepting jobs and waits for the pipeline to finish.
    ///
    /// With `drain`, every queued job runs to completion. Without it, jobs not yet started
    /// are counted as abandoned and in-flight calls finish.
    pub async fn shutdown(self, drain: bool) -> DispatchReport {
        if !drain {
            self.abandon.store(true, Ordering::Release);
        }
        drop(self.job_tx);

        if let Err(e) = self.pipeline.await {
            error!(error = %e, "Dispatch pipeline task failed");
        }

        let report = self.stats.snapshot();
        info!(
            submitted = report.submitted,
            completed = report.completed,
            skipped = report.skipped,
            dropped = report.dropped,
            unrecorded = report.unrecorded,
            abandoned = report.abandoned,
            "Dispatcher shut down"
        );
        report
    }
}
