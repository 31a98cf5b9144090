//! Retrying HTTP calls.
//!
//! The transport stays with the caller: the operation is any closure that
//! produces an [`http::Response`] or a transport error. A response counts as
//! success only with status `200 OK`; anything else becomes
//! [`HttpError::Status`], whose message is the status line.
//!
//! # Example
//!
//! ```rust
//! use backwater::http::retry_http;
//! use backwater::testing::RecordingSleeper;
//! use backwater::RetryConfig;
//! use http::{Response, StatusCode};
//!
//! # tokio_test::block_on(async {
//! let config = RetryConfig::new()
//!     .with_max_attempts(2)
//!     .with_sleeper(RecordingSleeper::new());
//!
//! let result = retry_http(
//!     || async {
//!         Ok::<_, std::io::Error>(
//!             Response::builder()
//!                 .status(StatusCode::TOO_MANY_REQUESTS)
//!                 .body(())
//!                 .unwrap(),
//!         )
//!     },
//!     config,
//! )
//! .await;
//!
//! let err = result.unwrap_err();
//! assert!(err.is_exhausted());
//! assert_eq!(err.into_error().unwrap().to_string(), "429 Too Many Requests");
//! # });
//! ```

use std::future::Future;

use http::{Response, StatusCode};
use thiserror::Error;

use crate::retry::{retry_until, Outcome, RetryConfig};

/// A response arrived, but not with `200 OK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{status}")]
pub struct UnexpectedStatus {
    status: StatusCode,
}

impl UnexpectedStatus {
    /// Wrap a non-success status.
    pub fn new(status: StatusCode) -> Self {
        Self { status }
    }

    /// The status that was received.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Failure of one HTTP attempt.
#[derive(Debug, Error)]
pub enum HttpError<E> {
    /// The caller's transport failed.
    #[error("{0}")]
    Transport(E),
    /// The server answered with something other than `200 OK`.
    #[error(transparent)]
    Status(#[from] UnexpectedStatus),
}

impl<E> HttpError<E> {
    /// The status, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(unexpected) => Some(unexpected.status()),
            Self::Transport(_) => None,
        }
    }

    /// Returns true if the transport failed before any status arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Pass `200 OK` responses through, turn every other status into an error.
pub fn ensure_ok<B, E>(response: Response<B>) -> Result<Response<B>, HttpError<E>> {
    match response.status() {
        StatusCode::OK => Ok(response),
        status => Err(UnexpectedStatus::new(status).into()),
    }
}

/// A retry predicate for failures worth trying again: transport errors,
/// `408`, `429` and any `5xx`.
///
/// ```rust
/// use backwater::http::{is_transient, HttpError, UnexpectedStatus};
/// use http::StatusCode;
///
/// let throttled: HttpError<()> = UnexpectedStatus::new(StatusCode::TOO_MANY_REQUESTS).into();
/// let missing: HttpError<()> = UnexpectedStatus::new(StatusCode::NOT_FOUND).into();
///
/// assert!(is_transient(&throttled));
/// assert!(!is_transient(&missing));
/// ```
pub fn is_transient<E>(error: &HttpError<E>) -> bool {
    match error.status() {
        None => true,
        Some(status) => {
            status == StatusCode::REQUEST_TIMEOUT
                || status == StatusCode::TOO_MANY_REQUESTS
                || status.is_server_error()
        }
    }
}

/// Retry an HTTP call until it returns `200 OK`.
pub async fn retry_http<B, E, F, Fut>(
    mut operation: F,
    config: RetryConfig<HttpError<E>>,
) -> Outcome<Response<B>, HttpError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response<B>, E>>,
{
    retry_until(
        move || {
            let fut = operation();
            async move { fut.await.map_err(HttpError::Transport) }
        },
        ensure_ok,
        config,
    )
    .await
}
