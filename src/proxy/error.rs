//! Request-terminating proxy errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::session::SessionError;
use crate::upstream::FetchError;

/// Errors that end a proxied request before a body is returned.
///
/// Transform failures are not here: they degrade to pass-through.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Inbound request could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No usable base origin.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Upstream could not be reached or read.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Session(SessionError::NoBinding) => "no_binding",
            Self::Session(_) => "invalid_base",
            Self::Fetch(_) => "fetch_error",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), format!("{self}\n")).into_response()
    }
}
