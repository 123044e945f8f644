//! Scripted transport for exercising the fetch layer without a network.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use dashmap::DashMap;

use crate::fetch::{Transport, TransportResponse};

/// A configurable response for [`MockTransport`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// An HTTP response with the given status and body.
    Status { status: u16, body: String },
    /// A transport-level failure (connection refused, DNS, ...).
    Failure(String),
}

impl MockResponse {
    /// A 200 response with the given body.
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: body.to_string(),
        }
    }
}

/// A hand-rolled [`Transport`] for tests.
///
/// Stub each URL with a fixed response or a sequence (one per call, the last
/// repeating once exhausted). Unstubbed URLs return 404. Every call is
/// recorded for [`call_count`](MockTransport::call_count) /
/// [`requests`](MockTransport::requests) assertions.
#[derive(Default)]
pub struct MockTransport {
    /// Per-URL response scripts; popped front-first, last entry repeats.
    stubs: DashMap<String, Vec<MockResponse>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub `url` to always return `response`.
    pub fn stub(&self, url: &str, response: MockResponse) {
        self.stubs.insert(url.to_string(), vec![response]);
    }

    /// Stub `url` to return `responses` in order, repeating the last one.
    pub fn stub_sequence(&self, url: &str, responses: Vec<MockResponse>) {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        self.stubs.insert(url.to_string(), responses);
    }

    /// How many times `url` has been requested.
    pub fn call_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .map(|reqs| reqs.iter().filter(|r| r.as_str() == url).count())
            .unwrap_or(0)
    }

    /// Every requested URL, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_response(&self, url: &str) -> MockResponse {
        match self.stubs.get_mut(url) {
            Some(mut script) => {
                if script.len() > 1 {
                    script.remove(0)
                } else {
                    script[0].clone()
                }
            }
            None => MockResponse::status(404, "unstubbed url"),
        }
    }
}

impl Transport for MockTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, String>> + Send + 'a>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        let response = self.next_response(url);

        Box::pin(async move {
            match response {
                MockResponse::Status { status, body } => Ok(TransportResponse { status, body }),
                MockResponse::Failure(message) => Err(message),
            }
        })
    }
}
