//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval and timeouts > 0)
//! - Check that every backend host is a usable `host:port` authority
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::BalancerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("empty hosts list")]
    EmptyHosts,

    #[error("host #{0} is blank")]
    BlankHost(usize),

    #[error("invalid host address: {0}")]
    InvalidHost(String),

    #[error("health check path must start with '/': {0}")]
    InvalidHealthPath(String),

    #[error("health check interval could not be 0")]
    ZeroInterval,

    #[error("health check timeout could not be 0")]
    ZeroProbeTimeout,

    #[error("proxy timeout could not be 0")]
    ZeroForwardTimeout,

    #[error("shutdown timeout could not be 0")]
    ZeroShutdownTimeout,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.hosts.is_empty() {
        errors.push(ValidationError::EmptyHosts);
    }

    for (index, host) in config.hosts.iter().enumerate() {
        if host.trim().is_empty() {
            errors.push(ValidationError::BlankHost(index));
        } else if !is_valid_authority(host) {
            errors.push(ValidationError::InvalidHost(host.clone()));
        }
    }

    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(config.health_check.path.clone()));
    }

    if config.health_check.interval_ms == 0 {
        errors.push(ValidationError::ZeroInterval);
    }

    if config.health_check.timeout_ms == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }

    if config.timeouts.forward_ms == 0 {
        errors.push(ValidationError::ZeroForwardTimeout);
    }

    if config.timeouts.shutdown_secs == 0 {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True when `host` is a bare `host[:port]` with no scheme, path or credentials.
pub(crate) fn is_valid_authority(host: &str) -> bool {
    if host.contains("://") || host.contains('/') || host.contains('@') {
        return false;
    }

    match Url::parse(&format!("http://{host}")) {
        Ok(url) => url.host_str().is_some() && url.query().is_none() && url.fragment().is_none(),
        Err(_) => false,
    }
}
