//! The retry executor.
//!
//! [`RetryConfig::execute`] drives the loop:
//!
//! 1. stop with [`RetryError::Cancelled`] if the cancellation handle fired
//! 2. call the operation; `Ok` is returned as is
//! 3. ask the retry predicate; a refusal ends the loop with [`RetryError::Rejected`]
//! 4. wait the computed backoff, racing the cancellation handle
//! 5. tell the `on_retry` observer, then go again
//!
//! Once every allowed attempt has failed and been waited out, the loop ends
//! with [`RetryError::Exhausted`]. No wait happens after a success.
//!
//! # Quick Start
//!
//! ```rust
//! use backwater::{retry, RetryConfig};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let calls = &AtomicU32::new(0);
//! let config = RetryConfig::new()
//!     .with_max_attempts(4)
//!     .with_backoff(Duration::from_millis(1));
//!
//! let value = retry(
//!     move || async move {
//!         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
//!             Err("flaky")
//!         } else {
//!             Ok(42)
//!         }
//!     },
//!     config,
//! )
//! .await;
//!
//! assert_eq!(value, Ok(42));
//! assert_eq!(calls.load(Ordering::SeqCst), 3);
//! # });
//! ```

mod config;
mod error;

pub use config::{RetryConfig, RetryEvent};
pub use error::{RetryError, RetryExhausted};

use std::future::Future;

use tokio::time::Instant;

/// What a retry run produces: the operation's value or why it never arrived.
pub type Outcome<T, E> = Result<T, RetryError<E>>;

impl<E> RetryConfig<E> {
    /// Run `operation` until it succeeds, the predicate refuses, attempts run
    /// out, or the cancellation handle fires.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Outcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let mut attempt = 0u32;
        let mut last_error = None;

        while attempt < self.max_attempts {
            if let Some(reason) = self.cancellation.reason() {
                #[cfg(feature = "tracing")]
                tracing::info!(%reason, attempts = attempt, "retry cancelled before attempt");
                return Err(RetryError::Cancelled {
                    reason,
                    attempts: attempt,
                });
            }

            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            attempt += 1;

            if !self.should_retry(&error) {
                #[cfg(feature = "tracing")]
                tracing::info!(attempts = attempt, "error is not retryable");
                return Err(RetryError::Rejected {
                    error,
                    attempts: attempt,
                });
            }

            let delay = self.delay_for(attempt);
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, ?delay, "attempt failed, backing off");

            tokio::select! {
                biased;
                reason = self.cancellation.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::info!(%reason, attempts = attempt, "retry cancelled during backoff");
                    return Err(RetryError::Cancelled { reason, attempts: attempt });
                }
                () = self.sleeper.sleep(delay) => {}
            }

            self.notify(&RetryEvent {
                attempt,
                error: &error,
                delay,
                elapsed: start.elapsed(),
            });
            last_error = Some(error);
        }

        match last_error {
            Some(error) => {
                let total_duration = start.elapsed();
                #[cfg(feature = "tracing")]
                tracing::warn!(attempts = attempt, ?total_duration, "retry exhausted");
                Err(RetryError::Exhausted(RetryExhausted::new(
                    error,
                    attempt,
                    total_duration,
                )))
            }
            None => Err(RetryError::NoAttempts),
        }
    }
}

/// Retry `operation` under `config`.
///
/// Each call of `operation` must produce a fresh future; the executor never
/// polls a future twice.
pub async fn retry<T, E, F, Fut>(operation: F, config: RetryConfig<E>) -> Outcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    config.execute(operation).await
}

/// Retry `operation`, treating a returned value as success only if `accept`
/// lets it through.
///
/// `accept` turns a value that arrived without error but still signals
/// failure into an error, which is then classified like any other.
///
/// ```rust
/// use backwater::testing::RecordingSleeper;
/// use backwater::{retry_until, RetryConfig};
///
/// # tokio_test::block_on(async {
/// let config = RetryConfig::new()
///     .with_max_attempts(2)
///     .with_sleeper(RecordingSleeper::new());
///
/// let result = retry_until(
///     || async { Ok::<_, String>(503u16) },
///     |status: u16| if status == 200 { Ok(status) } else { Err(format!("status {status}")) },
///     config,
/// )
/// .await;
///
/// assert_eq!(result.unwrap_err().into_error(), Some("status 503".to_string()));
/// # });
/// ```
pub async fn retry_until<T, E, F, Fut, A>(
    mut operation: F,
    accept: A,
    config: RetryConfig<E>,
) -> Outcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    A: Fn(T) -> Result<T, E>,
{
    let accept = &accept;
    config
        .execute(move || {
            let fut = operation();
            async move { fut.await.and_then(accept) }
        })
        .await
}
