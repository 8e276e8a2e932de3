//! Error types.
//!
//! `DrillError` covers the recoverable failures of the quiz core. `ProviderError`
//! represents failures of a question source; it lives here so the practice
//! engine can downcast and classify errors for retry decisions without string
//! matching.

use thiserror::Error;

use crate::model::Difficulty;
use crate::session::SessionState;

/// Errors raised by the session, scorer, error book, and persistence adapter.
#[derive(Debug, Error)]
pub enum DrillError {
    /// An action was attempted outside its legal session state.
    #[error("cannot {action} while the session is {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },

    /// A persisted slot failed to parse.
    #[error("stored slot '{slot}' is malformed: {message}")]
    MalformedStoredData { slot: String, message: String },

    /// The question source produced no questions.
    #[error("no questions available for {category}/{difficulty}")]
    EmptyGeneration {
        category: String,
        difficulty: Difficulty,
    },

    /// A question violates the model invariants.
    #[error("invalid question '{id}': {reason}")]
    InvalidQuestion { id: String, reason: String },

    /// An answer referenced a question that is not part of the session.
    #[error("unknown question id: {0}")]
    UnknownQuestion(String),

    /// Built-in exams cannot be removed from the catalog.
    #[error("exam '{0}' is built in and cannot be deleted")]
    ProtectedExam(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors that can occur when requesting questions from a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The endpoint returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The endpoint returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The endpoint answered with questions that violate the model invariants.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::InvalidPayload(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_provider_errors() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ProviderError::InvalidPayload("no answer".into()).is_permanent());
        assert!(!ProviderError::Timeout(30).is_permanent());
        assert!(!ProviderError::RateLimited { retry_after_ms: 10 }.is_permanent());
    }

    #[test]
    fn retry_after_only_for_rate_limits() {
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: 2500
            }
            .retry_after_ms(),
            Some(2500)
        );
        assert_eq!(ProviderError::NetworkError("down".into()).retry_after_ms(), None);
    }

    #[test]
    fn invalid_state_message_names_state() {
        let err = DrillError::InvalidState {
            action: "submit an answer",
            state: SessionState::Submitted,
        };
        assert_eq!(
            err.to_string(),
            "cannot submit an answer while the session is submitted"
        );
    }
}
