// ABOUTME: Error types for capability provider invocations
// ABOUTME: A provider error fails exactly one task and is recorded in the run report

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Provider rate limited the request")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Provider returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
