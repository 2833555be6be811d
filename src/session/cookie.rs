//! Session token transport over cookies.
//!
//! The token is form-urlencoded so origins containing `;`, `,` or spaces
//! survive the round trip through the browser.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use std::time::Duration;
use url::form_urlencoded;

/// Build the `Set-Cookie` value delivering `token` until `expires_at`.
pub fn set_cookie(name: &str, token: &str, expires_at: DateTime<Utc>, ttl: Duration) -> String {
    let value: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
    format!(
        "{name}={value}; Path=/; Expires={}; Max-Age={}; HttpOnly; SameSite=Lax",
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT"),
        ttl.as_secs(),
    )
}

/// Same as [`set_cookie`], as a header value.
pub fn set_cookie_header(
    name: &str,
    token: &str,
    expires_at: DateTime<Utc>,
    ttl: Duration,
) -> Option<HeaderValue> {
    HeaderValue::from_str(&set_cookie(name, token, expires_at, ttl)).ok()
}

/// Find the cookie called `name` across all `Cookie` headers and decode it.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| decode(v.trim().trim_matches('"')))
}

fn decode(value: &str) -> String {
    form_urlencoded::parse(format!("v={value}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_set_cookie_format() {
        let expires = Utc.with_ymd_and_hms(2024, 3, 5, 10, 1, 0).unwrap();

        let cookie = set_cookie(
            "proxy-base-url",
            "http://example.com/dir/",
            expires,
            Duration::from_secs(60),
        );
        assert_eq!(
            cookie,
            "proxy-base-url=http%3A%2F%2Fexample.com%2Fdir%2F; Path=/; \
             Expires=Tue, 05 Mar 2024 10:01:00 GMT; Max-Age=60; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_round_trip_through_cookie_header() {
        let token = "http://example.com/a;b,c d/";
        let set = set_cookie("proxy-base-url", token, Utc::now(), Duration::from_secs(60));
        let pair = set.split(';').next().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&format!("other=1; {pair}")).unwrap());
        assert_eq!(read_cookie(&headers, "proxy-base-url").as_deref(), Some(token));
    }

    #[test]
    fn test_read_cookie_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("b=2; proxy-base-url=http://x.example/"),
        );

        assert_eq!(
            read_cookie(&headers, "proxy-base-url").as_deref(),
            Some("http://x.example/")
        );
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}
