//! Best-effort operator notifications.
//!
//! `notify` never blocks the pipeline and never fails; delivery problems are logged.

mod feishu;

pub use feishu::FeishuAlertSink;

use crate::config::AlertConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Fire-and-forget; returns immediately.
    fn notify(&self, title: &str, body: &str);

    /// Waits (bounded) for outstanding deliveries, so alerts raised just before exit are sent.
    async fn flush(&self, _timeout: Duration) {}
}

/// Sink used when no webhook is configured.
#[derive(Debug, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    fn notify(&self, title: &str, body: &str) {
        warn!(alert.title = %title, alert.body = %body, "Operator alert (no webhook configured)");
    }
}

pub fn from_config(cfg: &AlertConfig, http: reqwest::Client) -> Arc<dyn AlertSink> {
    match cfg.feishu_webhook_url.clone() {
        Some(url) => Arc::new(FeishuAlertSink::new(url, http)),
        None => Arc::new(LogAlertSink),
    }
}
