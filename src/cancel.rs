//! Cancellation and deadlines for retry loops.
//!
//! A [`Cancellation`] combines an explicit [`CancellationToken`] with an
//! optional deadline. The executor asks it two things: "are we already
//! cancelled?" before every attempt, and "wake me when cancelled" while it
//! sleeps between attempts.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a retry loop stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelReason {
    /// The token was cancelled explicitly.
    #[error("operation cancelled")]
    Cancelled,
    /// The deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Handle the executor observes to abort early.
///
/// The default handle never fires.
///
/// # Examples
///
/// ```rust
/// use backwater::{CancelReason, Cancellation};
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let cancellation = Cancellation::new(token.clone());
/// assert_eq!(cancellation.reason(), None);
///
/// token.cancel();
/// assert_eq!(cancellation.reason(), Some(CancelReason::Cancelled));
/// ```
#[derive(Debug, Clone)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A handle that only fires when `token` is cancelled.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A handle that never fires.
    pub fn never() -> Self {
        Self::new(CancellationToken::new())
    }

    /// Also fire once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Also fire once `timeout` has elapsed from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason if the handle has already fired.
    ///
    /// An explicit cancel wins over an expired deadline.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            Some(CancelReason::Cancelled)
        } else if self.deadline.is_some_and(|d| d <= Instant::now()) {
            Some(CancelReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves when the token is cancelled or the deadline passes.
    pub async fn cancelled(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => CancelReason::Cancelled,
                () = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::never()
    }
}

impl From<CancellationToken> for Cancellation {
    fn from(token: CancellationToken) -> Self {
        Self::new(token)
    }
}
