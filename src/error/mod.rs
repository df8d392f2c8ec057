mod oauth;
mod relay;
mod workflow;

pub use oauth::OauthError;
pub use relay::RelayError;
pub use workflow::WorkflowError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
