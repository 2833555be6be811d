//! Upstream fetch client.
//!
//! # Responsibilities
//! - Issue a GET against an absolute URL
//! - Buffer the body in memory, bounded by `max_body_bytes`
//! - Release the connection on every exit path (the response is dropped)

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use bytes::{Bytes, BytesMut};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Errors that can occur while fetching from upstream.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect or protocol failure.
    #[error("Error fetching {url}: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream did not answer in time.
    #[error("Error fetching {url}: timed out")]
    Timeout { url: Url },

    /// The body could not be read to the end.
    #[error("Error reading body from {url}: {source}")]
    Body {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    /// The body exceeded the buffering limit.
    #[error("Error fetching {url}: body exceeds {limit} bytes")]
    TooLarge { url: Url, limit: usize },
}

impl FetchError {
    pub fn url(&self) -> &Url {
        match self {
            Self::Transport { url, .. }
            | Self::Timeout { url }
            | Self::Body { url, .. }
            | Self::TooLarge { url, .. } => url,
        }
    }
}

/// Performs GET requests on behalf of the proxy.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, FetchError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client. Redirects are followed.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestFetcher {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    async fn read_body(
        &self,
        url: &Url,
        mut response: reqwest::Response,
    ) -> Result<Bytes, FetchError> {
        let limit = self.max_body_bytes;
        let too_large = || FetchError::TooLarge {
            url: url.clone(),
            limit,
        };

        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(too_large());
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify(url, e, true))?
        {
            if body.len() + chunk.len() > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, FetchError> {
        tracing::debug!(url = %url, "Fetching upstream");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(url, e, false))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = self.read_body(url, response).await?;

        Ok(FetchedResource {
            status,
            content_type,
            body,
        })
    }
}

fn classify(url: &Url, err: reqwest::Error, reading_body: bool) -> FetchError {
    let url = url.clone();
    if err.is_timeout() {
        FetchError::Timeout { url }
    } else if reading_body {
        FetchError::Body { url, source: err }
    } else {
        FetchError::Transport { url, source: err }
    }
}
