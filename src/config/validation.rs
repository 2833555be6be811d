//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the reserved query parameter and cookie name are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field}: '{value}' is not a valid token")]
    InvalidToken { field: &'static str, value: String },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingApiKey,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.session.ttl_secs == 0 {
        errors.push(ValidationError::Zero("session.ttl_secs"));
    }
    check_token(&mut errors, "session.cookie_name", &config.session.cookie_name);
    check_token(&mut errors, "session.base_param", &config.session.base_param);

    if config.upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.request_timeout_secs"));
    }
    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("upstream.max_body_bytes"));
    }
    if config.transform.max_pixels == 0 {
        errors.push(ValidationError::Zero("transform.max_pixels"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingApiKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

// Cookie names and query keys share the RFC 7230 token alphabet here.
fn check_token(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if !valid {
        errors.push(ValidationError::InvalidToken {
            field,
            value: value.to_string(),
        });
    }
}
