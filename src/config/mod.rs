//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides, secrets)
//!     → validation.rs (semantic checks)
//!     → SignerConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Secrets only come from the environment and never serialize

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, NodeConfig, ObservabilityConfig, OwnerPolicy, SecretString, SignerConfig, SigningConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ConfigViolation};
