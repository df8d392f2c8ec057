use super::IsRetryable;
use super::relay::RelayError;
use crate::http::UPSTREAM_BODY_PREVIEW_CHARS;
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use thiserror::Error as ThisError;

/// Failure of one refresh-token exchange.
#[derive(Debug, ThisError)]
pub enum OauthError {
    /// Token endpoint unreachable or timed out; the seed was not consumed.
    #[error("Token endpoint transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// OAuth error body from the authority, e.g. `invalid_grant` for a seed that was already used.
    #[error(
        "Token endpoint rejected the grant: {error} ({})",
        .description.as_deref().unwrap_or("no description")
    )]
    Rejected {
        error: String,
        description: Option<String>,
    },

    #[error("Token endpoint response could not be parsed: {message}. Body: {body}")]
    Parse { message: String, body: String },

    #[error("Token exchange failed: {message}")]
    Other { message: String },
}

impl IsRetryable for OauthError {
    /// Only transport failures are retried. A rejected or unparseable answer may mean the
    /// seed was consumed, and replaying it cannot help.
    fn is_retryable(&self) -> bool {
        match self {
            OauthError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

type TokenRequestError = RequestTokenError<
    HttpClientError<ReqwestClientError>,
    StandardErrorResponse<BasicErrorResponseType>,
>;

impl From<TokenRequestError> for OauthError {
    fn from(e: TokenRequestError) -> Self {
        match e {
            RequestTokenError::ServerResponse(resp) => OauthError::Rejected {
                error: resp.error().to_string(),
                description: resp.error_description().cloned(),
            },
            RequestTokenError::Request(HttpClientError::Reqwest(inner)) => {
                OauthError::Transport(*inner)
            }
            RequestTokenError::Request(other) => OauthError::Other {
                message: format!("token request failed: {other}"),
            },
            RequestTokenError::Parse(parse_err, body) => {
                let body = String::from_utf8_lossy(&body);
                OauthError::Parse {
                    message: parse_err.to_string(),
                    body: format!("{:.len$}", body, len = UPSTREAM_BODY_PREVIEW_CHARS),
                }
            }
            RequestTokenError::Other(message) => OauthError::Other { message },
        }
    }
}

impl From<TokenRequestError> for RelayError {
    fn from(e: TokenRequestError) -> Self {
        OauthError::from(e).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_grant_is_not_retried_and_keeps_description() {
        let err = OauthError::Rejected {
            error: "invalid_grant".to_string(),
            description: Some("refresh token already used".to_string()),
        };
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Token endpoint rejected the grant: invalid_grant (refresh token already used)"
        );
    }

    #[test]
    fn parse_and_other_failures_are_not_retried() {
        let parse = OauthError::Parse {
            message: "expected value".to_string(),
            body: "<html>".to_string(),
        };
        let other = OauthError::Other {
            message: "no refresh token".to_string(),
        };
        assert!(!parse.is_retryable());
        assert!(!other.is_retryable());
    }
}
