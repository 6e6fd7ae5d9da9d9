//! Fetch orchestration errors.

use thiserror::Error;

/// Failure of a wrapped fetch operation.
///
/// Cancellation is expected and silent: it never reaches the operation's
/// error state or callbacks. Any other failure is retried while attempts
/// remain, then surfaced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request was superseded or the consumer was disposed.
    #[error("request cancelled")]
    Cancelled,

    /// The backend reported a failure.
    #[error("{0}")]
    Backend(String),
}

impl FetchError {
    /// Build a backend failure from any displayable error.
    pub fn backend(message: impl Into<String>) -> Self {
        FetchError::Backend(message.into())
    }

    /// Whether this is the silent cancellation class.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

impl From<crate::backend::BackendError> for FetchError {
    fn from(error: crate::backend::BackendError) -> Self {
        FetchError::Backend(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_classification() {
        assert!(FetchError::Cancelled.is_cancelled());
        assert!(!FetchError::backend("boom").is_cancelled());
    }

    #[test]
    fn test_backend_error_message() {
        let error = FetchError::backend("connection reset");
        assert_eq!(error.to_string(), "connection reset");
    }

    #[test]
    fn test_from_backend_error() {
        let error: FetchError = crate::backend::BackendError::Query("no such table".into()).into();
        assert!(matches!(error, FetchError::Backend(_)));
        assert!(error.to_string().contains("no such table"));
    }
}
