//! Response shaping.
//!
//! # Design Decisions
//! - Transformed bodies are answered with 200; pass-through keeps the upstream 2xx
//! - Non-2xx upstream responses keep their status, body and content type
//! - Header values that cannot be represented are dropped, not rejected

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::transform::TransformOutcome;
use crate::upstream::FetchedResource;

/// Response for a successful (2xx) fetch, after the transform decision.
pub fn outcome_response(upstream_status: StatusCode, outcome: TransformOutcome) -> Response {
    let content_type = outcome.content_type().map(str::to_string);
    let (status, body) = match outcome {
        TransformOutcome::Transformed(body) => (StatusCode::OK, body),
        TransformOutcome::PassThrough { body, .. } => (upstream_status, body),
    };
    with_content_type(status, content_type.as_deref(), Body::from(body))
}

/// Response for an upstream non-2xx status. The upstream body is returned
/// untransformed; an empty body is replaced by a short description.
pub fn upstream_status_response(url: &Url, fetched: FetchedResource) -> Response {
    if fetched.body.is_empty() {
        let reason = fetched.status.canonical_reason().unwrap_or("");
        let message = format!(
            "Error fetching {url}: {} {reason}\n",
            fetched.status.as_u16()
        );
        return (fetched.status, message).into_response();
    }
    with_content_type(
        fetched.status,
        fetched.content_type.as_deref(),
        Body::from(fetched.body),
    )
}

fn with_content_type(status: StatusCode, content_type: Option<&str>, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}
