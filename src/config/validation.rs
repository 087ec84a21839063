//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every problem is reported, not
//! just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::agent::PatternCategory;
use crate::config::schema::{IdentityConfig, ADMIN_KEY_PLACEHOLDER};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("resolver.trusted_headers: invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("resolver.trusted_headers: duplicate header {0:?}")]
    DuplicateHeader(String),

    #[error("patterns.{0}: empty pattern")]
    EmptyPattern(PatternCategory),

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Validate `config`, collecting every error.
pub fn validate_config(config: &IdentityConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut seen = HashSet::new();
    for name in &config.resolver.trusted_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        } else if !seen.insert(name.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateHeader(name.clone()));
        }
    }

    for category in PatternCategory::ALL {
        let overrides = config.patterns.overrides(category);
        if overrides
            .add
            .iter()
            .chain(&overrides.remove)
            .any(|p| p.trim().is_empty())
        {
            errors.push(ValidationError::EmptyPattern(category));
        }
    }

    if config.admin.enabled {
        let key = config.admin.api_key.trim();
        if key.is_empty() || key == ADMIN_KEY_PLACEHOLDER {
            errors.push(ValidationError::MissingAdminKey);
        }
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
