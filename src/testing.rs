//! Testing utilities for code that retries.
//!
//! - [`RecordingSleeper`]: a [`Sleeper`] that returns at once and remembers
//!   every delay it was asked for, so backoff schedules can be asserted
//!   without waiting
//! - [`CallCounter`]: a cloneable counter for counting operation invocations
//!   from inside `async move` blocks
//!
//! # Example
//!
//! ```rust
//! use backwater::testing::{CallCounter, RecordingSleeper};
//! use backwater::{retry, RetryConfig};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let sleeper = RecordingSleeper::new();
//! let calls = CallCounter::new();
//!
//! let config = RetryConfig::new()
//!     .with_max_attempts(4)
//!     .with_backoff(Duration::from_secs(2))
//!     .with_exponential_backoff()
//!     .with_sleeper(sleeper.clone());
//!
//! let result = retry(
//!     || {
//!         let calls = calls.clone();
//!         async move {
//!             calls.tick();
//!             Err::<(), _>("unavailable")
//!         }
//!     },
//!     config,
//! )
//! .await;
//!
//! assert!(result.is_err());
//! assert_eq!(calls.count(), 4);
//! assert_eq!(
//!     sleeper.delays(),
//!     vec![
//!         Duration::from_secs(4),
//!         Duration::from_secs(8),
//!         Duration::from_secs(16),
//!         Duration::from_secs(32),
//!     ]
//! );
//! # });
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::sleep::Sleeper;

/// A [`Sleeper`] that completes immediately and records requested delays.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create a sleeper with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of every delay requested so far.
    pub fn total(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        future::ready(()).boxed()
    }
}

/// Counts calls across clones.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicU32>);

impl CallCounter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call; returns how many calls came before this one.
    pub fn tick(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    /// Calls recorded so far.
    pub fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}
