//! Fetch-and-respond orchestration.
//!
//! Per request:
//! ```text
//! explicit base? ── yes → bind, Set-Cookie, resolve against the explicit base
//!                └─ no  → resolve against the session's bound origin
//!   → fetch (no retries)
//!   → non-2xx: forward status
//!   → image/*: transform on a blocking worker, fall back to pass-through
//!   → otherwise: pass-through
//! ```

use arc_swap::ArcSwap;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::ProxyConfig;
use crate::observability::metrics;
use crate::proxy::error::ProxyError;
use crate::proxy::request::ProxyRequest;
use crate::proxy::response::{outcome_response, upstream_status_response};
use crate::session::cookie::set_cookie_header;
use crate::session::{BaseSource, SessionBinder};
use crate::transform::codec::is_image;
use crate::transform::{ImageTransformer, TransformError, TransformOutcome};
use crate::upstream::Fetcher;

/// Drives one proxied request from binding to response.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<ArcSwap<ProxyConfig>>,
    binder: SessionBinder,
    fetcher: Arc<dyn Fetcher>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<ArcSwap<ProxyConfig>>,
        binder: SessionBinder,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            binder,
            fetcher,
        }
    }

    pub async fn handle(&self, request: ProxyRequest) -> Response {
        let start = Instant::now();
        let config = self.config.load_full();
        let mut set_cookie = None;

        let base = match request.explicit_base.as_deref() {
            Some(explicit) => {
                let ttl = Duration::from_secs(config.session.ttl_secs);
                match self.binder.bind(explicit, ttl) {
                    Ok(binding) => {
                        metrics::record_session_bind();
                        set_cookie = set_cookie_header(
                            &config.session.cookie_name,
                            &binding.token,
                            binding.expires_at,
                            ttl,
                        );
                    }
                    Err(e) => return self.fail(ProxyError::from(e), &request, start),
                }
                BaseSource::Explicit(explicit)
            }
            None => BaseSource::Session(request.session_token.as_deref()),
        };

        let mut response = match self.forward(&config, base, &request.reference).await {
            Ok((outcome, response)) => {
                metrics::record_request(outcome, response.status().as_u16(), start);
                response
            }
            Err(e) => self.fail(e, &request, start),
        };

        if let Some(cookie) = set_cookie {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        response
    }

    async fn forward(
        &self,
        config: &ProxyConfig,
        base: BaseSource<'_>,
        reference: &str,
    ) -> Result<(&'static str, Response), ProxyError> {
        let url = self.binder.resolve(base, reference)?;
        tracing::debug!(url = %url, reference, "Resolved upstream URL");

        let fetched = self.fetcher.fetch(&url).await?;

        if !fetched.status.is_success() {
            tracing::warn!(
                url = %url,
                status = %fetched.status,
                "Upstream returned non-success status"
            );
            return Ok(("upstream_status", upstream_status_response(&url, fetched)));
        }

        let status = fetched.status;
        let outcome = self
            .apply_transform(config, &url, fetched.content_type, fetched.body)
            .await;
        metrics::record_transform(outcome.label());
        Ok((outcome.label(), outcome_response(status, outcome)))
    }

    async fn apply_transform(
        &self,
        config: &ProxyConfig,
        url: &Url,
        content_type: Option<String>,
        body: Bytes,
    ) -> TransformOutcome {
        let wants_transform =
            config.transform.enabled && content_type.as_deref().is_some_and(is_image);
        if !wants_transform {
            return TransformOutcome::PassThrough {
                body,
                content_type,
                cause: None,
            };
        }

        let engine = ImageTransformer::from_config(&config.transform);
        let original = body.clone();
        let ct = content_type.clone();
        let outcome = match tokio::task::spawn_blocking(move || engine.process(ct.as_deref(), body))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => TransformOutcome::PassThrough {
                body: original,
                content_type,
                cause: Some(TransformError::Task(e.to_string())),
            },
        };

        if let TransformOutcome::PassThrough { cause: Some(e), .. } = &outcome {
            tracing::error!(
                url = %url,
                kind = e.kind(),
                error = %e,
                "Error converting image, returning original"
            );
        }
        outcome
    }

    fn fail(&self, error: ProxyError, request: &ProxyRequest, start: Instant) -> Response {
        match &error {
            ProxyError::Fetch(e) => {
                tracing::error!(url = %e.url(), error = %e, "Upstream fetch failed");
            }
            other => {
                tracing::warn!(path = %request.path, error = %other, "Cannot resolve upstream URL");
            }
        }
        metrics::record_request(error.outcome(), error.status().as_u16(), start);
        error.into_response()
    }
}
