//! Bounded concurrent dispatch of enrichment jobs.
//!
//! - `job.rs`: [`DispatchJob`] and parameter filtering
//! - `workflow.rs`: [`WorkflowEndpoint`] and the HTTP client
//! - `classify.rs`: auth-failure classification of endpoint errors
//! - `dispatcher.rs`: worker pipeline with one forced-rotation retry per job

pub mod classify;
mod dispatcher;
mod job;
mod workflow;

pub use dispatcher::{DispatchReport, Dispatcher, DispatcherSettings, JobOutcome};
pub use job::{ChannelParams, DispatchJob};
pub use workflow::{CozeWorkflowClient, WorkflowEndpoint, WorkflowReceipt};
