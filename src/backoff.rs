//! Backoff strategies and wait-duration calculation.
//!
//! Everything here is pure: a [`BackoffStrategy`] maps a base duration and a
//! 1-based retry number to a delay, and [`compute_wait`] layers jitter and a
//! ceiling on top of it.
//!
//! # Examples
//!
//! ```rust
//! use backwater::backoff::{compute_wait, BackoffStrategy};
//! use std::time::Duration;
//!
//! let base = Duration::from_secs(2);
//! let wait = compute_wait(base, 3, &BackoffStrategy::Exponential, Duration::ZERO, Duration::ZERO);
//!
//! assert_eq!(wait, Duration::from_secs(16));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

/// Signature of a caller-supplied backoff function: `(base, attempt) -> delay`.
pub type CustomBackoff = dyn Fn(Duration, u32) -> Duration + Send + Sync;

/// How the delay grows from one retry to the next.
#[derive(Clone, Default)]
pub enum BackoffStrategy {
    /// Every retry waits `base`.
    #[default]
    Constant,
    /// Delay grows linearly: `base * attempt`.
    Linear,
    /// Delay doubles: `base * 2^attempt`.
    Exponential,
    /// Delay follows the Fibonacci sequence: `base * fib(attempt)`.
    Fibonacci,
    /// Caller-supplied function of `(base, attempt)`.
    Custom(Arc<CustomBackoff>),
}

impl BackoffStrategy {
    /// Wrap a closure as a custom strategy.
    ///
    /// ```rust
    /// use backwater::backoff::BackoffStrategy;
    /// use std::time::Duration;
    ///
    /// let squared = BackoffStrategy::custom(|base, n| base * n * n);
    /// assert_eq!(squared.delay(Duration::from_secs(2), 3), Duration::from_secs(18));
    /// ```
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Duration, u32) -> Duration + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// The raw delay for a 1-based retry number, before jitter and ceiling.
    pub fn delay(&self, base: Duration, attempt: u32) -> Duration {
        match self {
            Self::Constant => base,
            Self::Linear => base.saturating_mul(attempt),
            Self::Exponential => scale(base, 1u128.checked_shl(attempt).unwrap_or(u128::MAX)),
            Self::Fibonacci => scale(base, fibonacci(attempt)),
            Self::Custom(f) => f(base, attempt),
        }
    }
}

impl fmt::Debug for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant => f.write_str("Constant"),
            Self::Linear => f.write_str("Linear"),
            Self::Exponential => f.write_str("Exponential"),
            Self::Fibonacci => f.write_str("Fibonacci"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Compute how long to wait before retry number `attempt` (1-based).
///
/// - `ceiling`: upper bound on the result, `Duration::ZERO` disables it
/// - `max_jitter`: a uniform random duration in `[0, max_jitter)` is added,
///   `Duration::ZERO` disables it
///
/// The ceiling is applied after jitter, so a jittered delay never exceeds it.
pub fn compute_wait(
    base: Duration,
    attempt: u32,
    strategy: &BackoffStrategy,
    ceiling: Duration,
    max_jitter: Duration,
) -> Duration {
    let delay = strategy.delay(base, attempt).saturating_add(jitter(max_jitter));

    if !ceiling.is_zero() && delay > ceiling {
        ceiling
    } else {
        delay
    }
}

/// A uniform random duration in `[0, max)`, or zero when `max` is zero.
fn jitter(max: Duration) -> Duration {
    let max_nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    if max_nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rand::rng().random_range(0..max_nanos))
}

/// `base * factor`, saturating at `Duration::MAX`.
fn scale(base: Duration, factor: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let nanos = base.as_nanos().saturating_mul(factor);
    match u64::try_from(nanos / NANOS_PER_SEC) {
        Ok(secs) => Duration::new(secs, (nanos % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    }
}

/// Calculate the nth Fibonacci number, saturating.
fn fibonacci(n: u32) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut a = 0u128;
    let mut b = 1u128;
    for _ in 1..n {
        let temp = a.saturating_add(b);
        a = b;
        b = temp;
    }
    b
}
