//! Shared error type for the HTTP agents.

use std::time::Duration;
use thiserror::Error;

use ciq_core::CiqError;

/// Errors surfaced by the outbound HTTP agents.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The upstream request was sent but failed or returned an error
    /// status.
    #[error("Process error ({status_code:?}): {message}")]
    ProcessError {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    /// The request could not be built or executed at all.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Anything else (response parsing, unexpected shapes).
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    pub fn process_error_with_retry_after(
        status_code: u16,
        message: String,
        is_retryable: bool,
        retry_after: Duration,
    ) -> Self {
        Self::ProcessError {
            status_code: Some(status_code),
            message,
            is_retryable,
            retry_after: Some(retry_after),
        }
    }

    /// Whether another attempt may succeed (timeouts, 5xx, rate limits).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProcessError { is_retryable, .. } => *is_retryable,
            _ => false,
        }
    }

    /// Upstream-suggested delay before retrying, when it sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::ProcessError { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status code of the failed request, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ProcessError { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl From<AgentError> for CiqError {
    fn from(err: AgentError) -> Self {
        CiqError::upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_flag() {
        let err = AgentError::ProcessError {
            status_code: Some(503),
            message: "unavailable".to_string(),
            is_retryable: true,
            retry_after: None,
        };
        assert!(err.is_retryable());
        assert!(!AgentError::ExecutionFailed("no key".to_string()).is_retryable());
    }

    #[test]
    fn test_maps_into_upstream() {
        let err: CiqError = AgentError::Other("bad json".to_string()).into();
        assert!(err.is_upstream());
    }
}
