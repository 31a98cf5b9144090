//! HTTP retry scenarios against a local mock server.

use std::time::Duration;

use backwater::http::{is_transient, retry_http, HttpError};
use backwater::testing::{CallCounter, RecordingSleeper};
use backwater::{Outcome, RetryConfig, RetryError, RetryEvent};
use serde::Deserialize;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Payload {
    content: String,
}

type Config = RetryConfig<HttpError<reqwest::Error>>;

fn config(sleeper: &RecordingSleeper) -> Config {
    RetryConfig::new()
        .with_backoff(Duration::from_secs(2))
        .with_sleeper(sleeper.clone())
}

/// GET `url`, buffering the body into an `http::Response`.
async fn get(
    client: &reqwest::Client,
    url: &str,
) -> Result<http::Response<String>, reqwest::Error> {
    let response = client.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;
    Ok(http::Response::builder()
        .status(status)
        .body(body)
        .expect("status from a real response is valid"))
}

async fn fetch(
    url: String,
    config: Config,
) -> Outcome<http::Response<String>, HttpError<reqwest::Error>> {
    let client = reqwest::Client::new();
    retry_http(
        || {
            let client = client.clone();
            let url = url.clone();
            async move { get(&client, &url).await }
        },
        config,
    )
    .await
}

#[tokio::test]
async fn success_on_first_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/success"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"content":"success"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let retries = CallCounter::new();
    let config = config(&sleeper).with_on_retry({
        let retries = retries.clone();
        move |_: &RetryEvent<'_, HttpError<reqwest::Error>>| {
            retries.tick();
        }
    });

    let response = fetch(format!("{}/success", server.uri()), config)
        .await
        .unwrap();

    let payload: Payload = serde_json::from_str(response.body()).unwrap();
    assert_eq!(
        payload,
        Payload {
            content: "success".to_string()
        }
    );
    assert_eq!(retries.count(), 0);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn non_success_status_on_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let result = fetch(
        format!("{}/throttled", server.uri()),
        config(&sleeper).with_max_attempts(4),
    )
    .await;

    match result {
        Err(RetryError::Exhausted(exhausted)) => {
            assert_eq!(exhausted.attempts, 4);
            assert_eq!(exhausted.final_error.to_string(), "429 Too Many Requests");
        }
        other => panic!("expected exhaustion, got {:?}", other.map(|r| r.status())),
    }
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(2); 4]);
    assert_eq!(sleeper.total(), Duration::from_secs(8));
}

#[tokio::test]
async fn recovers_after_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let response = fetch(
        format!("{}/flaky", server.uri()),
        config(&sleeper).with_max_attempts(5).with_exponential_backoff(),
    )
    .await
    .unwrap();

    assert_eq!(response.body(), "ok");
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_secs(4), Duration::from_secs(8)]
    );
}

#[tokio::test]
async fn permanent_status_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let result = fetch(
        format!("{}/missing", server.uri()),
        config(&sleeper).with_max_attempts(5).with_retry_if(is_transient),
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(err.attempts(), 1);
    assert_eq!(
        err.error().and_then(HttpError::status),
        Some(http::StatusCode::NOT_FOUND)
    );
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn transport_errors_are_retried() {
    // grab a free port and release it so nothing is listening there
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let uri = format!("http://{addr}");

    let sleeper = RecordingSleeper::new();
    let result = fetch(
        format!("{uri}/gone"),
        config(&sleeper).with_max_attempts(2).with_retry_if(is_transient),
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.is_exhausted());
    assert!(err.error().is_some_and(HttpError::is_transport));
    assert_eq!(sleeper.delays().len(), 2);
}
