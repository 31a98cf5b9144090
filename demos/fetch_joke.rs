//! Fetch a random joke, retrying transient failures.
//!
//! Run with: `cargo run --example fetch_joke`
//! Set `RUST_LOG=backwater=debug` to see each backoff.

use std::time::Duration;

use backwater::http::{is_transient, retry_http, HttpError};
use backwater::{Cancellation, RetryConfig, RetryEvent};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

const URL: &str = "https://official-joke-api.appspot.com/random_joke";

#[derive(Debug, Deserialize)]
struct Joke {
    setup: String,
    punchline: String,
}

async fn get(client: &reqwest::Client) -> Result<http::Response<String>, reqwest::Error> {
    let response = client.get(URL).send().await?;
    let status = response.status();
    let body = response.text().await?;
    Ok(http::Response::builder()
        .status(status)
        .body(body)
        .expect("status from a real response is valid"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = reqwest::Client::new();
    let config = RetryConfig::new()
        .with_max_attempts(3)
        .with_backoff(Duration::from_secs(2))
        .with_exponential_backoff()
        .with_max_jitter(Duration::from_millis(250))
        .with_backoff_limit(Duration::from_secs(10))
        .with_retry_if(is_transient)
        .with_cancellation(Cancellation::never().with_timeout(Duration::from_secs(30)))
        .with_on_retry(|event: &RetryEvent<'_, HttpError<reqwest::Error>>| {
            tracing::warn!(
                attempt = event.attempt,
                waited = ?event.delay,
                error = %event.error,
                "retrying request"
            );
        });

    let response = match retry_http(|| get(&client), config).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(%err, attempts = err.attempts(), "request failed");
            std::process::exit(1);
        }
    };

    match serde_json::from_str::<Joke>(response.body()) {
        Ok(joke) => {
            println!("{}", joke.setup);
            println!("{}", joke.punchline);
        }
        Err(err) => {
            tracing::error!(%err, "failed to decode joke");
            std::process::exit(1);
        }
    }
}
