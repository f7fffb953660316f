//! The transport seam used by every component that touches the network.
//!
//! Components never talk to reqwest directly; they take a `Fetcher` at
//! construction so tests can substitute a scripted transport and count calls.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use thiserror::Error;
use tracing::debug;

/// HTTP request timeout in seconds.
/// 30s allows for slow CDN responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A read request as seen by the cache and interceptor: method plus URL.
/// This pair is the request identity that keys cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    pub method: Method,
    pub url: String,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
        }
    }

    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }
}

/// A captured response: status plus the full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport-level failure with no response, e.g. the host is unreachable.
    /// Mock transports use this to simulate being offline.
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

/// The injected transport capability.
///
/// Returns `Ok` for any response the server produced, including error
/// statuses; `Err` only when no response was obtained at all.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<FetchedResponse, FetchError>> + Send;
}

/// Production transport over reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<FetchedResponse, FetchError> {
        let url: reqwest::Url = request
            .url
            .parse()
            .map_err(|_| FetchError::InvalidUrl(request.url.clone()))?;

        debug!(method = %request.method, url = %request.url, "fetching");

        let response = self
            .client
            .request(request.method.clone(), url)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(FetchedResponse { status, body })
    }
}
