//! # Network Access
//!
//! The `Fetch` trait is the single seam between the caching proxy and the
//! origin server. The production implementation wraps a shared
//! `reqwest::Client` built once from configuration; tests substitute a mock.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::ProxyConfig;
use crate::error::ProxyError;
use crate::request::ProxyRequest;
use crate::response::ProxyResponse;

/// Asynchronous access to the origin server
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Perform the network call and buffer the response.
    ///
    /// A resolved non-2xx response is returned as `Ok` with its status; only
    /// transport-level failures surface as `Err`.
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, ProxyError>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &ProxyConfig) -> Result<Client, ProxyError> {
    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(5) // Allow multiple connections to same host
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(ProxyError::from)
}

/// Production fetcher backed by a shared `reqwest::Client`
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        Ok(Self {
            client: create_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        debug!(method = %request.method, url = %request.url, "network fetch");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await?;

        ProxyResponse::from_reqwest(response).await
    }
}
