//! Resilient JSON fetching: bounded retries over a pluggable transport,
//! with force-cache reuse of previously seen responses.
//!
//! The transport is a trait object so tests can script responses without a
//! network; [`HttpTransport`] is the real reqwest-backed implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::cache::ResponseCache;

/// Default retry budget for a fetch (initial attempt not counted).
pub const DEFAULT_RETRIES: u32 = 3;

/// Default per-request timeout for the HTTP transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("dupework/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum FetchError {
    /// Retry budget exhausted against a non-200 response.
    #[error("fetch failed with status {0}")]
    Status(u16),
    /// The transport could not complete the request at all.
    #[error("transport error: {0}")]
    Transport(String),
    /// A 200 response whose body is not valid JSON.
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// A raw HTTP response as seen by the fetch layer.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// One HTTP GET. Errors are transport-level only; any response with a
/// status code comes back as `Ok`.
pub trait Transport: Send + Sync {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, String>> + Send + 'a>>;
}

/// reqwest-backed transport with a per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for HttpTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, String>> + Send + 'a>> {
        Box::pin(async move {
            let resp = self
                .client
                .get(url)
                .header("User-Agent", USER_AGENT)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| e.to_string())?;

            let status = resp.status().as_u16();
            let body = resp.text().await.map_err(|e| e.to_string())?;
            Ok(TransportResponse { status, body })
        })
    }
}

/// JSON fetcher with a bounded retry budget and a URL-keyed response cache.
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
}

impl ResilientFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: ResponseCache::new(),
        }
    }

    /// Fetcher over the real HTTP transport.
    pub fn over_http(timeout: Duration) -> Self {
        Self::new(Arc::new(HttpTransport::new(timeout)))
    }

    /// Fetch `url` and parse its body as JSON.
    ///
    /// With `use_cache`, a previously stored response for the URL is reused
    /// without contacting the server. A non-200 status consumes one retry
    /// and goes back to the network with the cache disabled, so a retry can
    /// never replay a stale failure; when the budget is exhausted the last
    /// status is the error. Transport failures surface immediately.
    pub async fn fetch_json(
        &self,
        url: &str,
        retries: u32,
        use_cache: bool,
    ) -> Result<Arc<Value>, FetchError> {
        if use_cache
            && let Some(hit) = self.cache.get(url)
        {
            tracing::debug!(url, "served from response cache");
            return Ok(hit);
        }

        let mut retries_left = retries;
        loop {
            let response = self
                .transport
                .get(url)
                .await
                .map_err(FetchError::Transport)?;

            if response.status == 200 {
                let value: Value = serde_json::from_str(&response.body)
                    .map_err(|e| FetchError::MalformedBody(e.to_string()))?;
                let value = Arc::new(value);
                self.cache.insert(url, value.clone());
                return Ok(value);
            }

            if retries_left == 0 {
                return Err(FetchError::Status(response.status));
            }
            retries_left -= 1;
            tracing::warn!(
                url,
                status = response.status,
                retries_left,
                "retrying fetch with cache disabled"
            );
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockResponse, MockTransport};

    fn make_fetcher(transport: MockTransport) -> (Arc<MockTransport>, ResilientFetcher) {
        let transport = Arc::new(transport);
        (transport.clone(), ResilientFetcher::new(transport))
    }

    #[tokio::test]
    async fn success_parses_and_caches() {
        let transport = MockTransport::new();
        transport.stub("http://ol/a.json", MockResponse::ok(r#"{"name": "x"}"#));
        let (transport, fetcher) = make_fetcher(transport);

        let value = fetcher.fetch_json("http://ol/a.json", 3, true).await.unwrap();
        assert_eq!(value["name"], "x");
        assert_eq!(transport.call_count("http://ol/a.json"), 1);

        // Second fetch is served from cache: no new transport call.
        fetcher.fetch_json("http://ol/a.json", 3, true).await.unwrap();
        assert_eq!(transport.call_count("http://ol/a.json"), 1);
    }

    #[tokio::test]
    async fn cache_disabled_always_hits_the_network() {
        let transport = MockTransport::new();
        transport.stub("http://ol/a.json", MockResponse::ok("{}"));
        let (transport, fetcher) = make_fetcher(transport);

        fetcher.fetch_json("http://ol/a.json", 3, true).await.unwrap();
        fetcher.fetch_json("http://ol/a.json", 3, false).await.unwrap();
        assert_eq!(transport.call_count("http://ol/a.json"), 2);
    }

    #[tokio::test]
    async fn persistent_failure_exhausts_budget() {
        let transport = MockTransport::new();
        transport.stub("http://ol/a.json", MockResponse::status(500, "oops"));
        let (transport, fetcher) = make_fetcher(transport);

        let err = fetcher
            .fetch_json("http://ol/a.json", 3, true)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
        // Initial attempt plus three retries.
        assert_eq!(transport.call_count("http://ol/a.json"), 4);
    }

    #[tokio::test]
    async fn recovers_when_a_retry_succeeds() {
        let transport = MockTransport::new();
        transport.stub_sequence(
            "http://ol/a.json",
            vec![
                MockResponse::status(503, ""),
                MockResponse::status(503, ""),
                MockResponse::ok(r#"{"ok": true}"#),
            ],
        );
        let (transport, fetcher) = make_fetcher(transport);

        let value = fetcher.fetch_json("http://ol/a.json", 3, true).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(transport.call_count("http://ol/a.json"), 3);
    }

    #[tokio::test]
    async fn retries_bypass_a_stale_cached_response() {
        let transport = MockTransport::new();
        transport.stub_sequence(
            "http://ol/a.json",
            vec![MockResponse::status(500, ""), MockResponse::ok(r#"{"v": 2}"#)],
        );
        let (transport, fetcher) = make_fetcher(transport);
        fetcher.cache().insert(
            "http://ol/a.json",
            Arc::new(serde_json::json!({"v": 1})),
        );

        // use_cache = false forces the network; the 500 retry path must not
        // fall back to the cached value either.
        let value = fetcher
            .fetch_json("http://ol/a.json", 3, false)
            .await
            .unwrap();
        assert_eq!(value["v"], 2);
        assert_eq!(transport.call_count("http://ol/a.json"), 2);

        // The fresh response replaced the stale cache entry.
        let cached = fetcher.cache().get("http://ol/a.json").unwrap();
        assert_eq!(cached["v"], 2);
    }

    #[tokio::test]
    async fn zero_retries_fails_on_first_bad_status() {
        let transport = MockTransport::new();
        transport.stub("http://ol/a.json", MockResponse::status(404, ""));
        let (transport, fetcher) = make_fetcher(transport);

        let err = fetcher
            .fetch_json("http://ol/a.json", 0, true)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
        assert_eq!(transport.call_count("http://ol/a.json"), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_not_retried() {
        let transport = MockTransport::new();
        transport.stub("http://ol/a.json", MockResponse::ok("not json"));
        let (transport, fetcher) = make_fetcher(transport);

        let err = fetcher
            .fetch_json("http://ol/a.json", 3, true)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedBody(_)));
        assert_eq!(transport.call_count("http://ol/a.json"), 1);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_immediately() {
        let transport = MockTransport::new();
        transport.stub(
            "http://ol/a.json",
            MockResponse::Failure("connection refused".into()),
        );
        let (transport, fetcher) = make_fetcher(transport);

        let err = fetcher
            .fetch_json("http://ol/a.json", 3, true)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert_eq!(transport.call_count("http://ol/a.json"), 1);
    }
}
