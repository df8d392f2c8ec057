use crate::config::TokenConfig;
use crate::error::{IsRetryable, OauthError, RelayError};
use crate::oauth_utils::{OauthTokenResponse, RefreshOauth2Client, build_oauth2_client};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use oauth2::{RefreshToken, TokenResponse};
use std::time::Duration;
use tracing::{debug, error};

/// Result of one refresh-token exchange. The old refresh token is dead once this exists.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Issuing authority for access tokens.
#[async_trait]
pub trait TokenAuthority: Send + Sync {
    async fn exchange(&self, refresh_token: &str) -> Result<TokenPair, OauthError>;
}

/// OAuth2 `refresh_token` grant against the configured token endpoint.
pub struct OauthTokenAuthority {
    client: RefreshOauth2Client,
    http: reqwest::Client,
    retry_policy: ExponentialBuilder,
}

impl OauthTokenAuthority {
    pub fn new(cfg: &TokenConfig, http: reqwest::Client) -> Result<Self, RelayError> {
        let client = build_oauth2_client(
            &cfg.client_id,
            Some(cfg.client_secret.as_str()),
            cfg.token_url.as_str(),
        )?;

        // OAuth refresh: keep it small and deterministic.
        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3))
            .with_max_times(3)
            .with_jitter();

        Ok(Self {
            client,
            http,
            retry_policy,
        })
    }

    async fn exchange_once(&self, refresh_token: &str) -> Result<OauthTokenResponse, OauthError> {
        let token_result: OauthTokenResponse = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await?;
        Ok(token_result)
    }
}

#[async_trait]
impl TokenAuthority for OauthTokenAuthority {
    async fn exchange(&self, refresh_token: &str) -> Result<TokenPair, OauthError> {
        let token_response = (|| async { self.exchange_once(refresh_token).await })
            .retry(self.retry_policy)
            .when(|e: &OauthError| e.is_retryable())
            .notify(|err, dur: Duration| {
                error!(
                    "OAuth2 refresh retrying error {} with sleeping {:?}",
                    err.to_string(),
                    dur
                );
            })
            .await?;

        let refresh_token = token_response
            .refresh_token()
            .map(|rt| rt.secret().trim().to_string())
            .filter(|rt| !rt.is_empty())
            .ok_or_else(|| OauthError::Other {
                message: "token response carried no refresh token".to_string(),
            })?;

        debug!("Refresh token exchanged successfully");
        Ok(TokenPair {
            access_token: token_response.access_token().secret().to_string(),
            refresh_token,
        })
    }
}
