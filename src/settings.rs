//! Plain-data retry settings for configuration files.
//!
//! [`RetrySettings`] holds the parts of a [`RetryConfig`] that are data
//! rather than behavior, so they can live in an application's TOML or JSON
//! config. Durations are milliseconds; `0` disables the limit and the jitter.
//!
//! ```rust
//! # #[cfg(feature = "serde")] {
//! use backwater::{RetryConfig, RetrySettings};
//! use std::time::Duration;
//!
//! let settings: RetrySettings = serde_json::from_str(
//!     r#"{ "max_attempts": 5, "backoff_ms": 200, "strategy": "exponential" }"#,
//! )
//! .unwrap();
//!
//! let config: RetryConfig<std::io::Error> = settings.into();
//! assert_eq!(config.max_attempts(), 5);
//! assert_eq!(config.delay_for(2), Duration::from_millis(800));
//! # }
//! ```

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backoff::BackoffStrategy;
use crate::retry::RetryConfig;

/// Backoff strategies that can be named in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StrategyKind {
    /// See [`BackoffStrategy::Constant`].
    #[default]
    Constant,
    /// See [`BackoffStrategy::Linear`].
    Linear,
    /// See [`BackoffStrategy::Exponential`].
    Exponential,
    /// See [`BackoffStrategy::Fibonacci`].
    Fibonacci,
}

impl From<StrategyKind> for BackoffStrategy {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Constant => Self::Constant,
            StrategyKind::Linear => Self::Linear,
            StrategyKind::Exponential => Self::Exponential,
            StrategyKind::Fibonacci => Self::Fibonacci,
        }
    }
}

/// Serializable subset of [`RetryConfig`]. Missing fields take the
/// [`RetryConfig`] defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RetrySettings {
    /// Maximum attempts, the first call included.
    pub max_attempts: u32,
    /// Base backoff in milliseconds.
    pub backoff_ms: u64,
    /// How the backoff grows.
    pub strategy: StrategyKind,
    /// Cap on each wait in milliseconds; `0` for none.
    pub backoff_limit_ms: u64,
    /// Upper bound of random jitter in milliseconds; `0` for none.
    pub max_jitter_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1_000,
            strategy: StrategyKind::Constant,
            backoff_limit_ms: 0,
            max_jitter_ms: 0,
        }
    }
}

impl<E> RetryConfig<E> {
    /// Build a config from settings; hooks, cancellation and sleeper keep
    /// their defaults.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new()
            .with_max_attempts(settings.max_attempts)
            .with_backoff(Duration::from_millis(settings.backoff_ms))
            .with_strategy(settings.strategy.into())
            .with_backoff_limit(Duration::from_millis(settings.backoff_limit_ms))
            .with_max_jitter(Duration::from_millis(settings.max_jitter_ms))
    }
}

impl<E> From<RetrySettings> for RetryConfig<E> {
    fn from(settings: RetrySettings) -> Self {
        Self::from_settings(&settings)
    }
}
