//! Retry configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::backoff::{compute_wait, BackoffStrategy};
use crate::cancel::Cancellation;
use crate::sleep::{Sleeper, TokioSleeper};

type RetryIf<E> = dyn Fn(&E) -> bool + Send + Sync;
type OnRetry<E> = dyn Fn(&RetryEvent<'_, E>) + Send + Sync;

/// Information about a retry, passed to the `on_retry` observer.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which retry this is (1-indexed): the attempt that just failed.
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// How long the executor waited before this retry.
    pub delay: Duration,
    /// Total elapsed time since the first attempt.
    pub elapsed: Duration,
}

/// Everything the executor needs to know about one retry run.
///
/// Built from defaults plus `with_*` methods, each of which consumes and
/// returns the config, so they compose left to right. The executor only ever
/// reads it.
///
/// | Setting        | Default                 |
/// |----------------|-------------------------|
/// | max attempts   | 3                       |
/// | backoff        | 1s                      |
/// | strategy       | constant                |
/// | backoff limit  | none                    |
/// | max jitter     | none                    |
/// | retry if       | any error               |
/// | on retry       | no-op                   |
/// | cancellation   | never                   |
/// | sleeper        | [`TokioSleeper`]        |
///
/// # Examples
///
/// ```rust
/// use backwater::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::<std::io::Error>::new()
///     .with_max_attempts(5)
///     .with_backoff(Duration::from_millis(200))
///     .with_exponential_backoff()
///     .with_backoff_limit(Duration::from_secs(2));
///
/// assert_eq!(config.max_attempts(), 5);
/// assert_eq!(config.delay_for(1), Duration::from_millis(400));
/// assert_eq!(config.delay_for(4), Duration::from_secs(2));
/// ```
pub struct RetryConfig<E> {
    pub(crate) max_attempts: u32,
    pub(crate) backoff: Duration,
    pub(crate) strategy: BackoffStrategy,
    pub(crate) backoff_limit: Duration,
    pub(crate) max_jitter: Duration,
    pub(crate) retry_if: Option<Arc<RetryIf<E>>>,
    pub(crate) on_retry: Option<Arc<OnRetry<E>>>,
    pub(crate) cancellation: Cancellation,
    pub(crate) sleeper: Arc<dyn Sleeper>,
}

impl<E> RetryConfig<E> {
    /// Default number of attempts, the first call included.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Default base backoff.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

    /// A config with every setting at its default.
    pub fn new() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            backoff: Self::DEFAULT_BACKOFF,
            strategy: BackoffStrategy::Constant,
            backoff_limit: Duration::ZERO,
            max_jitter: Duration::ZERO,
            retry_if: None,
            on_retry: None,
            cancellation: Cancellation::never(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Set the maximum number of attempts, the first call included.
    ///
    /// Zero means the operation is never called.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the base backoff the strategy scales.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Cap every wait at `limit`. `Duration::ZERO` removes the cap.
    pub fn with_backoff_limit(mut self, limit: Duration) -> Self {
        self.backoff_limit = limit;
        self
    }

    /// Add up to `max_jitter` of random delay to every wait.
    /// `Duration::ZERO` disables jitter.
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Choose the backoff strategy.
    pub fn with_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Wait `backoff * attempt` before each retry.
    pub fn with_linear_backoff(self) -> Self {
        self.with_strategy(BackoffStrategy::Linear)
    }

    /// Wait `backoff * 2^attempt` before each retry.
    pub fn with_exponential_backoff(self) -> Self {
        self.with_strategy(BackoffStrategy::Exponential)
    }

    /// Compute each wait with `f(backoff, attempt)`.
    pub fn with_custom_backoff<F>(self, f: F) -> Self
    where
        F: Fn(Duration, u32) -> Duration + Send + Sync + 'static,
    {
        self.with_strategy(BackoffStrategy::custom(f))
    }

    /// Only retry errors for which `predicate` returns true.
    pub fn with_retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Some(Arc::new(predicate));
        self
    }

    /// Observe every retry. Called after the backoff wait, before the next
    /// attempt. Must not block.
    pub fn with_on_retry<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, E>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Abort when `cancellation` fires.
    pub fn with_cancellation(mut self, cancellation: impl Into<Cancellation>) -> Self {
        self.cancellation = cancellation.into();
        self
    }

    /// Wait through `sleeper` instead of the tokio timer.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Get the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Get the base backoff.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Get the backoff cap, if any.
    pub fn backoff_limit(&self) -> Option<Duration> {
        (!self.backoff_limit.is_zero()).then_some(self.backoff_limit)
    }

    /// Get the jitter bound, if any.
    pub fn max_jitter(&self) -> Option<Duration> {
        (!self.max_jitter.is_zero()).then_some(self.max_jitter)
    }

    /// Get the backoff strategy.
    pub fn strategy(&self) -> &BackoffStrategy {
        &self.strategy
    }

    /// Get the cancellation handle.
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// The wait before retry number `attempt` (1-based), jitter included.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        compute_wait(
            self.backoff,
            attempt,
            &self.strategy,
            self.backoff_limit,
            self.max_jitter,
        )
    }

    pub(crate) fn should_retry(&self, error: &E) -> bool {
        self.retry_if.as_ref().is_none_or(|retry_if| retry_if(error))
    }

    pub(crate) fn notify(&self, event: &RetryEvent<'_, E>) {
        if let Some(on_retry) = &self.on_retry {
            on_retry(event);
        }
    }
}

impl<E> Default for RetryConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            strategy: self.strategy.clone(),
            backoff_limit: self.backoff_limit,
            max_jitter: self.max_jitter,
            retry_if: self.retry_if.clone(),
            on_retry: self.on_retry.clone(),
            cancellation: self.cancellation.clone(),
            sleeper: Arc::clone(&self.sleeper),
        }
    }
}

impl<E> fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("strategy", &self.strategy)
            .field("backoff_limit", &self.backoff_limit)
            .field("max_jitter", &self.max_jitter)
            .field("cancellation", &self.cancellation)
            .field("sleeper", &self.sleeper)
            .finish_non_exhaustive()
    }
}
