//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the signer.
//! All types derive Serde traits for deserialization from config files.
//! Secrets are never read from or written to files; they come from the
//! environment and are wrapped in [`SecretString`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration for the signer service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SignerConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Remote node settings.
    pub node: NodeConfig,

    /// Transaction construction and signing policy.
    pub signing: SigningConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Shared secret callers must present. Environment only.
    #[serde(skip)]
    pub signer_secret: Option<SecretString>,

    /// Hex private key of the hot wallet. Environment only.
    #[serde(skip)]
    pub private_key: Option<SecretString>,
}

/// A string that never prints its contents.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 5 * 1024 * 1024, // 5MB
        }
    }
}

/// Remote node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Full-node HTTP API base URL.
    pub base_url: String,

    /// Optional TronGrid API key. Environment only.
    #[serde(skip)]
    pub api_key: Option<SecretString>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.shasta.trongrid.io".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// What to do when the signing key does not belong to the request's `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OwnerPolicy {
    /// Log a warning and sign anyway.
    #[default]
    Warn,
    /// Refuse to sign.
    Enforce,
}

impl std::str::FromStr for OwnerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(OwnerPolicy::Warn),
            "enforce" => Ok(OwnerPolicy::Enforce),
            other => Err(format!("unknown owner policy '{}'", other)),
        }
    }
}

/// Transaction construction and signing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Fee ceiling attached to contract invocations, in sun.
    pub fee_limit_sun: u64,

    /// Owner/key mismatch handling.
    pub owner_policy: OwnerPolicy,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            fee_limit_sun: 100_000_000, // 100 TRX
            owner_policy: OwnerPolicy::Warn,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for the health and readiness probes, in seconds.
    pub request_secs: u64,

    /// How long shutdown waits for signing jobs whose caller has gone.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
