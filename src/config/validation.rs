//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate paths, methods and addresses
//! - Detect probe paths that would shadow each other
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ScaffoldConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::Method;
use axum::routing::MethodFilter;
use thiserror::Error;

use crate::config::schema::ScaffoldConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must start with '/': {value:?}")]
    RelativePath { field: &'static str, value: String },

    #[error("{first} and {second} are both {path:?}")]
    DuplicatePath {
        first: &'static str,
        second: &'static str,
        path: String,
    },

    #[error("drain.timeout_ms must be greater than zero")]
    ZeroDrainTimeout,

    #[error("markdown.method is not a standard HTTP method: {0:?}")]
    InvalidMethod(String),

    #[error("observability.metrics_address is not a socket address: {0:?}")]
    InvalidMetricsAddress(String),
}

/// Route filter for a mark-down method; `None` for unknown or extension methods.
pub fn markdown_method_filter(method: &str) -> Option<MethodFilter> {
    Method::from_bytes(method.as_bytes())
        .ok()
        .and_then(|m| MethodFilter::try_from(m).ok())
}

pub fn validate_config(config: &ScaffoldConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut paths = vec![
        ("probes.health_path", config.probes.health_path.as_str()),
        ("probes.ready_path", config.probes.ready_path.as_str()),
    ];
    if let Some(markdown) = &config.markdown {
        paths.push(("markdown.path", markdown.path.as_str()));
        if markdown_method_filter(&markdown.method).is_none() {
            errors.push(ValidationError::InvalidMethod(markdown.method.clone()));
        }
    }

    for (i, &(field, path)) in paths.iter().enumerate() {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: path.to_string(),
            });
        }
        for &(other, other_path) in &paths[..i] {
            if other_path == path {
                errors.push(ValidationError::DuplicatePath {
                    first: other,
                    second: field,
                    path: path.to_string(),
                });
            }
        }
    }

    if config.drain.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDrainTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
