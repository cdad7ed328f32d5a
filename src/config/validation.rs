//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required secrets present (fail closed at boot)
//! - Validate value ranges (timeouts > 0, fee ceiling > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SignerConfig → Result<(), Vec<ConfigViolation>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::SignerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("signer secret is not configured (SIGNER_SECRET)")]
    MissingSignerSecret,

    #[error("private key is not configured (SIGNER_PRIVATE_KEY)")]
    MissingPrivateKey,

    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid node base URL '{0}'")]
    NodeUrl(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a configuration, returning every violation found.
pub fn validate_config(config: &SignerConfig) -> Result<(), Vec<ConfigViolation>> {
    let mut violations = Vec::new();

    if config.signer_secret.as_ref().map_or(true, |s| s.is_blank()) {
        violations.push(ConfigViolation::MissingSignerSecret);
    }
    if config.private_key.as_ref().map_or(true, |s| s.is_blank()) {
        violations.push(ConfigViolation::MissingPrivateKey);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        violations.push(ConfigViolation::BindAddress(config.listener.bind_address.clone()));
    }
    match url::Url::parse(&config.node.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => violations.push(ConfigViolation::NodeUrl(config.node.base_url.clone())),
    }
    if config.node.timeout_secs == 0 {
        violations.push(ConfigViolation::Zero("node.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        violations.push(ConfigViolation::Zero("timeouts.request_secs"));
    }
    if config.signing.fee_limit_sun == 0 {
        violations.push(ConfigViolation::Zero("signing.fee_limit_sun"));
    }
    if config.listener.max_body_bytes == 0 {
        violations.push(ConfigViolation::Zero("listener.max_body_bytes"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
