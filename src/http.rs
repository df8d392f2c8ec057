use crate::config::BasicConfig;
use crate::error::RelayError;
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use std::time::Duration;

/// Browser-like UA; the feed endpoints reject obvious bot agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Upper bound on upstream body text copied into logs and errors.
pub const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

/// Builds a reqwest client honouring the shared proxy, timeout and multiplexing settings.
pub fn build_http_client(cfg: &BasicConfig, user_agent: &str) -> Result<reqwest::Client, RelayError> {
    let mut headers = HeaderMap::new();
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent.to_string())
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(cfg.request_timeout_secs.max(1)));

    if let Some(proxy_url) = cfg.proxy.as_ref() {
        let proxy = reqwest::Proxy::all(proxy_url.as_str())
            .map_err(|e| RelayError::Configuration(format!("invalid basic.proxy url: {e}")))?;
        builder = builder.proxy(proxy);
    }

    if !cfg.enable_multiplexing {
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        builder = builder
            .http1_only()
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Duration::from_secs(0));
    } else {
        builder = builder.http2_adaptive_window(true);
    }

    builder
        .default_headers(headers)
        .build()
        .map_err(|e| RelayError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Reads a response body for diagnostics, truncated to [`UPSTREAM_BODY_PREVIEW_CHARS`].
pub async fn body_preview(resp: reqwest::Response) -> String {
    match resp.bytes().await {
        Ok(bytes) => {
            let raw_body = String::from_utf8_lossy(&bytes);
            format!("{:.len$}", raw_body, len = UPSTREAM_BODY_PREVIEW_CHARS)
        }
        Err(e) => format!("<failed to read body: {e}>"),
    }
}
