//! Fetch collaborator
//!
//! This module defines the seam between the crawl engine and the network:
//! - The [`Fetcher`] trait the coordinator calls for every request
//! - Request and response types carrying headers and session state
//! - Error classification into transient and permanent failures
//! - [`HttpFetcher`], the reqwest implementation

use crate::config::CrawlerConfig;
use crate::state::Session;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// One request to the fetch collaborator
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub use_js_rendering: bool,
    /// Session carried forward from earlier responses on this domain
    pub session: Session,
}

/// A successful (2xx) response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    /// URL after redirects
    pub final_url: Url,
    pub content_type: Option<String>,
    /// Cookies set by the response
    pub cookies: BTreeMap<String, String>,
    /// Local-storage entries; only browser backends produce these
    pub local_storage: BTreeMap<String, String>,
    pub duration: Duration,
}

impl FetchResponse {
    /// A 200 HTML response with no session changes
    pub fn html(final_url: Url, body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            final_url,
            content_type: Some("text/html; charset=utf-8".to_string()),
            cookies: BTreeMap::new(),
            local_storage: BTreeMap::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Fetch failures, as the coordinator sees them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("invalid request: {0}")]
    InvalidUrl(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Returns true if retrying may succeed
    ///
    /// | Failure | Transient |
    /// |---------|-----------|
    /// | Timeout, connection, body read | yes |
    /// | HTTP 429 and 5xx | yes |
    /// | Other HTTP errors | no |
    /// | Invalid URL or request | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection(_) | Self::Body(_) => true,
            Self::Http { status } => *status == 429 || *status >= 500,
            Self::InvalidUrl(_) => false,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Anything that can fetch a page
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one URL; non-2xx responses are returned as [`FetchError::Http`]
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Plain HTTP fetcher backed by reqwest
///
/// Cannot render JavaScript; requests asking for it get the raw HTML.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the crawler's timeouts
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        if request.use_js_rendering {
            debug!(
                "JavaScript rendering requested for {} but the HTTP fetcher cannot render; fetching raw HTML",
                request.url
            );
        }

        let start = Instant::now();
        let mut builder = self.client.get(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = request.session.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }

        let response = builder.send().await.map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(parse_set_cookie)
            .collect();

        let body = response.text().await.map_err(FetchError::from_reqwest)?;

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
            final_url,
            content_type,
            cookies,
            local_storage: BTreeMap::new(),
            duration: start.elapsed(),
        })
    }
}

/// Extracts the name and value from a Set-Cookie header
///
/// Attributes (Path, Expires, HttpOnly, ...) are ignored.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
