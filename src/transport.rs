//! HTTP transport: the fetch capability used for playlists and segments

use crate::config::{JobConfig, RetryConfig};
use crate::error::{Error, Result, TransportError};
use crate::retry::download_with_retry;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

/// Fetches the raw bytes behind a URL
///
/// Implementations own their retry policy: an error returned from `fetch` is
/// terminal and aborts the job.
#[async_trait]
pub trait SegmentFetcher: Send + Sync {
    /// Download `url` and return its body
    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, TransportError>;
}

/// Production [`SegmentFetcher`] backed by `reqwest`
///
/// Sends the default user agent plus the configured headers with every
/// request and retries transient failures with exponential backoff.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    /// Build a fetcher from a job configuration
    ///
    /// Fails with [`Error::Config`] on an invalid header or proxy.
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().default_headers(build_headers(config)?);

        if let Some(proxy) = &config.proxy {
            let mut p = reqwest::Proxy::all(&proxy.url)
                .map_err(|e| Error::config(format!("invalid proxy {}: {}", proxy.url, e), "proxy"))?;
            if let Some(username) = &proxy.username {
                p = p.basic_auth(username, proxy.password.as_deref().unwrap_or_default());
            }
            builder = builder.proxy(p);
        }

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e), "proxy"))?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<Bytes, TransportError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| TransportError::Request {
                    url: url.to_string(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl SegmentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, TransportError> {
        download_with_retry(&self.retry, || self.fetch_once(url)).await
    }
}

/// Default user agent overlaid with the caller's headers (caller wins)
fn build_headers(config: &JobConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let user_agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| Error::config(format!("invalid user agent: {}", e), "user_agent"))?;
    headers.insert(USER_AGENT, user_agent);

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::config(format!("invalid header name {:?}: {}", name, e), "headers"))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            Error::config(format!("invalid value for header {}: {}", name, e), "headers")
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}
