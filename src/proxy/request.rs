//! Inbound request model.
//!
//! # Responsibilities
//! - Drop the proxy's own scheme/host; only path + query are a reference
//! - Pull out the reserved base parameter and remove it from the query
//! - Read the session token cookie
//! - Reject malformed query strings before any fetch

use axum::http::{HeaderMap, Uri};
use url::form_urlencoded;

use crate::config::SessionConfig;
use crate::proxy::error::ProxyError;
use crate::session::cookie::read_cookie;

/// What the orchestrator needs to know about one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Inbound path as received.
    pub path: String,
    /// Path plus query with the base parameter removed, resolved upstream.
    pub reference: String,
    /// Value of the base parameter, when present and non-empty.
    pub explicit_base: Option<String>,
    /// Session token from the cookie, when present.
    pub session_token: Option<String>,
}

impl ProxyRequest {
    pub fn from_parts(
        uri: &Uri,
        headers: &HeaderMap,
        session: &SessionConfig,
    ) -> Result<Self, ProxyError> {
        let path = uri.path().to_string();
        let raw_query = uri.query().unwrap_or_default();
        check_percent_encoding(raw_query)?;

        let (query, explicit_base) = split_base_param(raw_query, &session.base_param);

        // URL parsing treats `\` as `/` in http(s) paths, and a leading "//"
        // would be read as a network-path reference that replaces the
        // upstream host.
        let escaped = path.replace('\\', "%5C");
        let trimmed = escaped.trim_start_matches('/');
        let mut reference = format!("/{trimmed}");
        if !query.is_empty() {
            reference.push('?');
            reference.push_str(&query);
        }

        Ok(Self {
            path,
            reference,
            explicit_base,
            session_token: read_cookie(headers, &session.cookie_name),
        })
    }

    /// The bare landing page: root path and no explicit base.
    pub fn is_landing(&self) -> bool {
        self.path == "/" && self.explicit_base.is_none()
    }
}

/// Remove every `param=...` pair from a raw query, keeping the rest of the
/// query byte-for-byte. Returns the remaining query and the first
/// non-empty value of `param`.
pub fn split_base_param(raw_query: &str, param: &str) -> (String, Option<String>) {
    let mut base = None;
    let mut kept = Vec::new();

    for segment in raw_query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = form_urlencoded::parse(segment.as_bytes())
            .next()
            .unwrap_or_default();
        if key == param {
            if base.is_none() && !value.is_empty() {
                base = Some(value.into_owned());
            }
        } else {
            kept.push(segment);
        }
    }

    (kept.join("&"), base)
}

fn check_percent_encoding(raw: &str) -> Result<(), ProxyError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(ProxyError::BadRequest(format!(
                    "invalid percent-encoding in query at byte {i}"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
