//! Base-origin binding and reference resolution.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::session::store::SessionStore;

/// Errors that can occur while binding or resolving.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No explicit base and no live binding for the session.
    #[error("No base URL bound for this session (missing or expired)")]
    NoBinding,

    /// The explicit base URL could not be used.
    #[error("Invalid base URL '{base}': {reason}")]
    InvalidBase { base: String, reason: String },

    /// The request reference could not be joined onto the base.
    #[error("Cannot resolve '{reference}' against {base}: {source}")]
    InvalidReference {
        reference: String,
        base: Url,
        #[source]
        source: url::ParseError,
    },
}

/// Where the base origin for a resolution comes from.
#[derive(Debug, Clone, Copy)]
pub enum BaseSource<'a> {
    /// A base URL supplied on this very request.
    Explicit(&'a str),
    /// The session token presented by the client, if any.
    Session(Option<&'a str>),
}

/// A freshly created binding, ready to be handed back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub token: String,
    pub origin: Url,
    pub expires_at: DateTime<Utc>,
}

/// Binds clients to base origins and resolves request references.
#[derive(Clone)]
pub struct SessionBinder {
    store: Arc<dyn SessionStore>,
}

impl SessionBinder {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Record the directory of `explicit_base` as this client's origin.
    ///
    /// The token is the origin prefix itself; the store entry keyed by it
    /// carries the server-side expiry.
    pub fn bind(&self, explicit_base: &str, ttl: Duration) -> Result<Binding, SessionError> {
        let origin = origin_prefix(&parse_base(explicit_base)?);
        let token = origin.as_str().to_string();
        let expires_at = self.store.put(&token, origin.clone(), ttl);

        tracing::info!(origin = %origin, expires_at = %expires_at, "Bound base origin");
        Ok(Binding {
            token,
            origin,
            expires_at,
        })
    }

    /// Resolve `reference` against the explicit base or the session's
    /// bound origin. An absolute reference replaces the base entirely.
    pub fn resolve(&self, base: BaseSource<'_>, reference: &str) -> Result<Url, SessionError> {
        let base = match base {
            BaseSource::Explicit(raw) => parse_base(raw)?,
            BaseSource::Session(token) => token
                .and_then(|t| self.store.get(t))
                .ok_or(SessionError::NoBinding)?,
        };

        base.join(reference)
            .map_err(|source| SessionError::InvalidReference {
                reference: reference.to_string(),
                base,
                source,
            })
    }
}

/// Parse a base URL, accepting only http(s) URLs with a host.
pub fn parse_base(raw: &str) -> Result<Url, SessionError> {
    let invalid = |reason: String| SessionError::InvalidBase {
        base: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Scheme, host and every path segment but the last, with a trailing slash.
/// Query and fragment are dropped.
pub fn origin_prefix(url: &Url) -> Url {
    let mut prefix = url.clone();
    let dir = match url.path().rfind('/') {
        Some(i) => &url.path()[..=i],
        None => "/",
    };
    prefix.set_path(dir);
    prefix.set_query(None);
    prefix.set_fragment(None);
    prefix
}
