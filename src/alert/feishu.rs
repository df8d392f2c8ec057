use super::AlertSink;
use async_trait::async_trait;
use chrono::Local;
use feedrelay_schema::FeishuCardMessage;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Posts red alert cards to a Feishu custom-bot webhook.
pub struct FeishuAlertSink {
    http: reqwest::Client,
    webhook: Url,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl FeishuAlertSink {
    pub fn new(webhook: Url, http: reqwest::Client) -> Self {
        Self {
            http,
            webhook,
            pending: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AlertSink for FeishuAlertSink {
    fn notify(&self, title: &str, body: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(alert.title = %title, "No async runtime; alert not delivered");
            return;
        };

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let message = FeishuCardMessage::alert(title, body, &timestamp);
        let http = self.http.clone();
        let webhook = self.webhook.clone();
        let title = title.to_string();

        let handle = runtime.spawn(async move {
            deliver(http, webhook, &title, &message).await;
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    async fn flush(&self, timeout: Duration) {
        let handles: Vec<JoinHandle<()>> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.drain(..).collect()
        };
        if handles.is_empty() {
            return;
        }

        let count = handles.len();
        if tokio::time::timeout(timeout, futures::future::join_all(handles))
            .await
            .is_err()
        {
            warn!(count, ?timeout, "Timed out flushing pending alerts");
        }
    }
}

async fn deliver(http: reqwest::Client, webhook: Url, title: &str, message: &FeishuCardMessage) {
    let resp = match http.post(webhook).json(message).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(alert.title = %title, error = %e, "Alert webhook request failed");
            return;
        }
    };

    let status = resp.status();
    let body: Option<Value> = resp.json().await.ok();
    // Feishu answers 200 with a non-zero `code` for rejected cards.
    let code = body
        .as_ref()
        .and_then(|b| b.get("code"))
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if status.is_success() && code == 0 {
        info!(alert.title = %title, "Alert delivered");
    } else {
        warn!(alert.title = %title, %status, code, "Alert webhook rejected the card");
        debug!(body = ?body, "Alert webhook response");
    }
}
