//! Pluggable time source for backoff waits.
//!
//! The executor never calls `tokio::time::sleep` directly; it asks its
//! configured [`Sleeper`]. Production code uses [`TokioSleeper`]; tests can
//! swap in [`RecordingSleeper`](crate::testing::RecordingSleeper) to skip real
//! delays and inspect what would have been waited.

use std::fmt::Debug;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

/// Something that can wait for a duration.
pub trait Sleeper: Send + Sync + Debug {
    /// Returns a future that completes once `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Waits on the tokio timer.
///
/// Honors tokio's paused test clock, so `#[tokio::test(start_paused = true)]`
/// drives it without real delays.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}
