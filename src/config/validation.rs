//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the server URL and the identity fields
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("config_server_url must not be empty")]
    EmptyServerUrl,

    #[error("config_server_url '{0}' is not a valid URL")]
    InvalidServerUrl(String),

    #[error("app_id must not be empty")]
    EmptyAppId,

    #[error("cluster_name must not be empty")]
    EmptyCluster,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.config_server_url.trim().is_empty() {
        errors.push(ValidationError::EmptyServerUrl);
    } else if Url::parse(&config.config_server_url).map_or(true, |url| url.cannot_be_a_base()) {
        errors.push(ValidationError::InvalidServerUrl(config.config_server_url.clone()));
    }

    if config.app_id.trim().is_empty() {
        errors.push(ValidationError::EmptyAppId);
    }

    if config.cluster_name.trim().is_empty() {
        errors.push(ValidationError::EmptyCluster);
    }

    if config.poll.failed_retry_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("poll.failed_retry_secs"));
    }

    if config.poll.long_poll_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("poll.long_poll_timeout_secs"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
