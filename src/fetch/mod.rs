//! Feed retrieval.
//!
//! [`fetch_bytes`] performs one bounded GET through an [`HttpClient`].
//! [`FeedSource`] is what the poll loop pulls from; [`HttpFeedSource`] binds a
//! client to the configured endpoint.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::FeedError;

/// Issues a GET against `url` and returns the whole response body.
///
/// The response is consumed before returning, so the connection is released
/// as soon as the body has been read.
///
/// # Errors
///
/// Returns [`FeedError::InvalidEndpoint`] if `url` does not parse, and
/// [`FeedError::Network`] on timeout, transport failure or a non-2xx status.
#[tracing::instrument(skip(client))]
pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Bytes, FeedError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FeedError::InvalidEndpoint {
        endpoint: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?.error_for_status()?;
    let body = resp.bytes().await?;
    debug!(bytes = body.len(), "Feed body received");
    Ok(body)
}

/// Loads feed bytes from a local file path or fetches them over HTTP.
pub async fn fetch_or_read<C: HttpClient + ?Sized>(
    client: &C,
    source: &str,
) -> Result<Bytes, FeedError> {
    if source.starts_with("http") {
        fetch_bytes(client, source).await
    } else {
        tokio::fs::read(source)
            .await
            .map(Bytes::from)
            .map_err(|source_err| FeedError::Io {
                path: source.to_string(),
                source: source_err,
            })
    }
}

/// Something the poll loop can pull one feed document from per cycle.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Bytes, FeedError>;

    /// Where the feed comes from, for logs and cycle records.
    fn describe(&self) -> &str;
}

/// A [`FeedSource`] that GETs a fixed endpoint through an [`HttpClient`].
pub struct HttpFeedSource<C> {
    client: C,
    endpoint: String,
}

impl<C: HttpClient> HttpFeedSource<C> {
    pub fn new(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> FeedSource for HttpFeedSource<C> {
    async fn fetch(&self) -> Result<Bytes, FeedError> {
        fetch_bytes(&self.client, &self.endpoint).await
    }

    fn describe(&self) -> &str {
        &self.endpoint
    }
}
