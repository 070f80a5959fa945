//! Test support utilities shared by unit and integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::HeaderMap;

use crate::error::ProxyError;
use crate::fetch::Fetch;
use crate::request::ProxyRequest;
use crate::response::ProxyResponse;
use crate::store::{StoreBackend, StoreResult};

/// Initialize tracing for a test, writing through the test harness.
///
/// Usage:
/// - `init_test_tracing!()` - uses DEBUG level (default)
/// - `init_test_tracing!(INFO)` - uses specified level
#[macro_export]
macro_rules! init_test_tracing {
    () => {
        $crate::init_test_tracing!(DEBUG)
    };
    ($level:ident) => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::$level)
            .with_test_writer()
            .try_init();
    };
}

/// Store that refuses every write; reads behave like an empty store
pub struct FailingStore;

#[async_trait]
impl StoreBackend for FailingStore {
    async fn contains(&self, _key: &str) -> StoreResult<bool> {
        Ok(false)
    }

    async fn get(&self, _key: &str) -> StoreResult<Option<ProxyResponse>> {
        Ok(None)
    }

    async fn put(&self, _key: String, _response: ProxyResponse) -> StoreResult<()> {
        Err(std::io::Error::other("store write refused"))
    }

    async fn remove(&self, _key: &str) -> StoreResult<bool> {
        Ok(false)
    }

    async fn clear(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn len(&self) -> StoreResult<u64> {
        Ok(0)
    }
}

#[derive(Clone)]
enum MockOutcome {
    Response(ProxyResponse),
    Error(String),
}

/// A scriptable fetcher: canned responses per exact URL, an offline switch,
/// and a record of every attempted request
#[derive(Default)]
pub struct MockFetcher {
    outcomes: Mutex<HashMap<String, MockOutcome>>,
    requests: Mutex<Vec<(String, HeaderMap)>>,
    offline: AtomicBool,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this response for the given URL
    pub fn respond(&self, url: &str, response: ProxyResponse) {
        self.outcomes
            .lock()
            .insert(url.to_string(), MockOutcome::Response(response));
    }

    /// Fail requests for the given URL with a network error
    pub fn fail(&self, url: &str, message: &str) {
        self.outcomes
            .lock()
            .insert(url.to_string(), MockOutcome::Error(message.to_string()));
    }

    /// Fail every request, simulating a lost connection
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs of every attempted request, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Headers sent with the first request for the given URL
    pub fn request_headers(&self, url: &str) -> Option<HeaderMap> {
        self.requests
            .lock()
            .iter()
            .find(|(requested, _)| requested == url)
            .map(|(_, headers)| headers.clone())
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        let url = request.url.as_str().to_string();
        self.requests
            .lock()
            .push((url.clone(), request.headers.clone()));

        if self.offline.load(Ordering::SeqCst) {
            return Err(ProxyError::Network(format!("offline: {url}")));
        }

        let outcome = self.outcomes.lock().get(&url).cloned();
        match outcome {
            Some(MockOutcome::Response(response)) => Ok(response),
            Some(MockOutcome::Error(message)) => Err(ProxyError::Network(message)),
            None => Err(ProxyError::Network(format!("no mock response for {url}"))),
        }
    }
}
