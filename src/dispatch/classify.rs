use crate::error::WorkflowError;
use reqwest::StatusCode;

/// Workflow API codes meaning the bearer token is missing, expired, or revoked.
pub const AUTH_ERROR_CODES: [i64; 3] = [4100, 4101, 700_012_006];

/// Lower-case substrings that mark an error message as an authentication problem.
const AUTH_MESSAGE_MARKERS: [&str; 6] = [
    "unauthorized",
    "token expired",
    "invalid token",
    "token invalid",
    "access token",
    "authentication",
];

fn message_indicates_auth(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    AUTH_MESSAGE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Whether an enrichment failure should trigger a forced credential rotation.
pub fn is_auth_failure(err: &WorkflowError) -> bool {
    match err {
        WorkflowError::UpstreamStatus { status, body } => {
            matches!(*status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
                || message_indicates_auth(body)
        }
        WorkflowError::Api { code, message } => {
            AUTH_ERROR_CODES.contains(code) || message_indicates_auth(message)
        }
        WorkflowError::Request(_) | WorkflowError::Parse(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: i64, message: &str) -> WorkflowError {
        WorkflowError::Api {
            code,
            message: message.to_string(),
        }
    }

    fn status(status: StatusCode, body: &str) -> WorkflowError {
        WorkflowError::UpstreamStatus {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn documented_codes_are_auth_failures() {
        assert!(is_auth_failure(&api(4100, "")));
        assert!(is_auth_failure(&api(4101, "whatever")));
        assert!(is_auth_failure(&api(700_012_006, "")));
    }

    #[test]
    fn message_markers_match_case_insensitively() {
        assert!(is_auth_failure(&api(1, "Access Token has expired")));
        assert!(is_auth_failure(&api(1, "UNAUTHORIZED")));
        assert!(is_auth_failure(&api(1, "authentication is invalid")));
    }

    #[test]
    fn unrelated_api_errors_are_not_auth_failures() {
        assert!(!is_auth_failure(&api(4000, "invalid parameter: title")));
        assert!(!is_auth_failure(&api(5000, "internal error")));
    }

    #[test]
    fn http_401_and_403_are_auth_failures_regardless_of_body() {
        assert!(is_auth_failure(&status(StatusCode::UNAUTHORIZED, "")));
        assert!(is_auth_failure(&status(StatusCode::FORBIDDEN, "<html>")));
        assert!(!is_auth_failure(&status(StatusCode::BAD_GATEWAY, "upstream down")));
        assert!(is_auth_failure(&status(
            StatusCode::BAD_REQUEST,
            r#"{"code":4100,"msg":"token expired"}"#
        )));
    }

    #[test]
    fn parse_errors_are_not_auth_failures() {
        assert!(!is_auth_failure(&WorkflowError::Parse("eof".to_string())));
    }
}
