//! # Response Representation
//!
//! The stored and returned form of an HTTP response: status, headers, body
//! bytes. Store entries and network results share this one type so strategies
//! can hand back either without conversion.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};

use crate::error::ProxyError;

/// A fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A plain 200 response with the given body
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), body.into())
    }

    /// An empty response with the given status
    pub fn with_status(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), Bytes::new())
    }

    /// The placeholder handed to the player when audio is neither cached nor
    /// reachable: a structured 503 instead of a failed call
    pub fn offline_audio_placeholder() -> Self {
        let body = serde_json::json!({ "error": "Audio not available offline" }).to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self::new(StatusCode::SERVICE_UNAVAILABLE, headers, Bytes::from(body))
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Drain a network response into its buffered form
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self, ProxyError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self::new(status, headers, body))
    }
}
