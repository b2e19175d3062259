//! Retrying JSON fetcher.
//!
//! Issues blocking-per-cycle GETs with a fixed attempt bound: a success
//! status returns the parsed body, any other status sleeps for the backoff
//! interval and tries again. One request in flight at a time.

use crate::error::{CollectError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Bounded-retry policy for downloads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts before the fetch fails with `FetchExhausted`.
    pub attempts: u32,
    /// Sleep between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

/// HTTP fetcher shared by both poll cycles.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher with the given retry policy and per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(retry: RetryPolicy, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, retry })
    }

    /// Downloads `uri` and parses the body as JSON.
    ///
    /// Exactly one GET is issued per attempt, always against the caller's
    /// `uri`. Non-success status codes trigger a backoff sleep and another
    /// attempt; transport errors propagate immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::FetchExhausted`] when every attempt came back
    /// with a non-success status, or [`CollectError::Http`] on a transport
    /// failure.
    pub async fn fetch_json(&self, uri: &str) -> Result<Value> {
        for attempt in 1..=self.retry.attempts {
            let response = self.client.get(uri).send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response.json().await?);
            }

            warn!(uri, attempt, %status, "Download attempt failed");
            if attempt < self.retry.attempts {
                tokio::time::sleep(self.retry.backoff).await;
            }
        }

        Err(CollectError::fetch_exhausted(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(attempts: u32) -> Fetcher {
        let retry = RetryPolicy {
            attempts,
            // Fast backoff so retry tests stay quick.
            backoff: Duration::from_millis(10),
        };
        Fetcher::new(retry, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn default_policy_matches_production_settings() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.backoff, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn success_returns_parsed_body_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": "bitcoin"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(5);
        let body = fetcher
            .fetch_json(&format!("{}/ticker", server.uri()))
            .await
            .unwrap();
        assert_eq!(body[0]["id"], "bitcoin");
    }

    #[tokio::test]
    async fn always_failing_server_uses_exactly_five_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker"))
            .respond_with(ResponseTemplate::new(503))
            .expect(5)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(5);
        let err = fetcher
            .fetch_json(&format!("{}/ticker", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::FetchExhausted { .. }));
    }

    #[tokio::test]
    async fn success_on_third_attempt_stops_retrying() {
        let server = MockServer::start().await;
        // Two failures, then a success; the fetcher must issue exactly
        // three GETs.
        Mock::given(method("GET"))
            .and(path("/ticker"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ticker"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(5);
        let body = fetcher
            .fetch_json(&format!("{}/ticker", server.uri()))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn non_json_success_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher(2);
        let err = fetcher
            .fetch_json(&format!("{}/ticker", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::Http(_)));
    }
}
