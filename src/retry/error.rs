//! Error types for retry operations.

use std::time::Duration;

use thiserror::Error;

use crate::cancel::CancelReason;

/// Error returned when all attempts failed with retryable errors.
///
/// Contains the final error along with metadata about the retry sequence.
///
/// # Examples
///
/// ```rust
/// use backwater::testing::RecordingSleeper;
/// use backwater::{retry, RetryConfig, RetryError};
///
/// # tokio_test::block_on(async {
/// let config = RetryConfig::new()
///     .with_max_attempts(3)
///     .with_sleeper(RecordingSleeper::new());
///
/// match retry(|| async { Err::<(), _>("always fails") }, config).await {
///     Err(RetryError::Exhausted(exhausted)) => {
///         assert_eq!(exhausted.final_error, "always fails");
///         assert_eq!(exhausted.attempts, 3);
///     }
///     other => panic!("expected exhaustion, got {:?}", other),
/// }
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("retry exhausted after {attempts} attempts ({total_duration:?}): {final_error}")]
pub struct RetryExhausted<E> {
    /// The error from the final attempt.
    #[source]
    pub final_error: E,
    /// Total number of attempts made.
    pub attempts: u32,
    /// Total time spent retrying.
    pub total_duration: Duration,
}

impl<E> RetryExhausted<E> {
    /// Create a new RetryExhausted error.
    pub fn new(final_error: E, attempts: u32, total_duration: Duration) -> Self {
        Self {
            final_error,
            attempts,
            total_duration,
        }
    }

    /// Extract the final error, discarding metadata.
    pub fn into_error(self) -> E {
        self.final_error
    }

    /// Get a reference to the final error.
    pub fn error(&self) -> &E {
        &self.final_error
    }
}

/// Why a retry loop ended without a success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    /// Every attempt failed and every error was retryable.
    #[error("{0}")]
    Exhausted(RetryExhausted<E>),
    /// The retry predicate refused to retry this error.
    #[error("{error}")]
    Rejected {
        /// The error the predicate rejected.
        error: E,
        /// Attempts made, including the rejected one.
        attempts: u32,
    },
    /// The cancellation handle fired before or during a backoff wait.
    #[error("{reason} after {attempts} attempts")]
    Cancelled {
        /// What fired.
        reason: CancelReason,
        /// Attempts made before cancellation was observed.
        attempts: u32,
    },
    /// The configuration allowed zero attempts.
    #[error("no attempts were made")]
    NoAttempts,
}

impl<E> RetryError<E> {
    /// The operation error, if one was observed.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Exhausted(exhausted) => Some(&exhausted.final_error),
            Self::Rejected { error, .. } => Some(error),
            Self::Cancelled { .. } | Self::NoAttempts => None,
        }
    }

    /// Extract the operation error, if one was observed.
    pub fn into_error(self) -> Option<E> {
        match self {
            Self::Exhausted(exhausted) => Some(exhausted.final_error),
            Self::Rejected { error, .. } => Some(error),
            Self::Cancelled { .. } | Self::NoAttempts => None,
        }
    }

    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted(exhausted) => exhausted.attempts,
            Self::Rejected { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
            Self::NoAttempts => 0,
        }
    }

    /// Returns the cancellation reason if the loop was cancelled.
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Returns true if the loop was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true if all attempts were used up.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// Returns true if the retry predicate stopped the loop.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
