//! # Backwater
//!
//! Retry with backoff for fallible async operations.
//!
//! Wrap any operation that returns `Result<T, E>` and let the executor handle
//! attempt limits, backoff timing, jitter, cancellation and observer hooks.
//!
//! - **Backoff**: constant, linear, exponential, Fibonacci or your own
//!   function, with an optional ceiling and random jitter
//! - **Cancellation**: a token and/or deadline, checked before every attempt
//!   and raced against every backoff wait
//! - **Time source**: swap the tokio timer for a [`Sleeper`] of your own;
//!   [`testing::RecordingSleeper`] makes backoff schedules testable without
//!   waiting
//! - **HTTP**: [`http::retry_http`] treats anything but `200 OK` as a failure
//!
//! ## Quick Example
//!
//! ```rust
//! use backwater::{retry, RetryConfig, RetryError};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let config = RetryConfig::new()
//!     .with_max_attempts(3)
//!     .with_backoff(Duration::from_millis(5))
//!     .with_exponential_backoff()
//!     .with_on_retry(|event| println!("retry #{} after {:?}", event.attempt, event.error));
//!
//! let result: Result<(), _> = retry(|| async { Err("connection refused") }, config).await;
//!
//! match result {
//!     Err(RetryError::Exhausted(exhausted)) => assert_eq!(exhausted.attempts, 3),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! # });
//! ```
//!
//! ## Features
//!
//! - `tracing` (default): log retries, exhaustion and cancellation through
//!   the `tracing` crate
//! - `serde` (default): derive `Serialize`/`Deserialize` for [`RetrySettings`]

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backoff;
pub mod cancel;
pub mod http;
pub mod retry;
pub mod settings;
pub mod sleep;
pub mod testing;

// Re-exports
pub use backoff::{compute_wait, BackoffStrategy};
pub use cancel::{CancelReason, Cancellation};
pub use retry::{
    retry, retry_until, Outcome, RetryConfig, RetryError, RetryEvent, RetryExhausted,
};
pub use settings::{RetrySettings, StrategyKind};
pub use sleep::{Sleeper, TokioSleeper};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backoff::BackoffStrategy;
    pub use crate::cancel::{CancelReason, Cancellation};
    pub use crate::retry::{retry, retry_until, Outcome, RetryConfig, RetryError, RetryEvent};
    pub use crate::sleep::Sleeper;
}
