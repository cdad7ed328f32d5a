//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{SecretString, SignerConfig};
use crate::config::validation::{validate_config, ConfigViolation};

pub const ENV_SIGNER_SECRET: &str = "SIGNER_SECRET";
pub const ENV_PRIVATE_KEY: &str = "SIGNER_PRIVATE_KEY";
pub const ENV_NODE_BASE: &str = "TRONGRID_BASE";
pub const ENV_PORT: &str = "PORT";
pub const ENV_API_KEY: &str = "TRON_PRO_API_KEY";
pub const ENV_FEE_LIMIT: &str = "SIGNER_FEE_LIMIT_SUN";
pub const ENV_OWNER_POLICY: &str = "SIGNER_OWNER_POLICY";
pub const ENV_LOG_LEVEL: &str = "SIGNER_LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", .0.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ConfigViolation>),
}

/// Load a TOML file (no validation; secrets are applied afterwards).
pub fn load_file(path: &Path) -> Result<SignerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: SignerConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests do not touch process state.
pub fn apply_env<F>(config: &mut SignerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(secret) = get(ENV_SIGNER_SECRET) {
        config.signer_secret = Some(SecretString::new(secret));
    }
    if let Some(key) = get(ENV_PRIVATE_KEY) {
        config.private_key = Some(SecretString::new(key.trim()));
    }
    if let Some(base) = get(ENV_NODE_BASE) {
        config.node.base_url = base.trim().to_string();
    }
    if let Some(api_key) = get(ENV_API_KEY) {
        config.node.api_key = Some(SecretString::new(api_key.trim()));
    }
    if let Some(port) = get(ENV_PORT) {
        let port: u16 = port.trim().parse().map_err(|e| ConfigError::Env {
            var: ENV_PORT,
            reason: format!("{}", e),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Some(fee_limit) = get(ENV_FEE_LIMIT) {
        config.signing.fee_limit_sun = fee_limit.trim().parse().map_err(|e| ConfigError::Env {
            var: ENV_FEE_LIMIT,
            reason: format!("{}", e),
        })?;
    }
    if let Some(policy) = get(ENV_OWNER_POLICY) {
        config.signing.owner_policy = policy
            .parse()
            .map_err(|reason| ConfigError::Env { var: ENV_OWNER_POLICY, reason })?;
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.observability.log_level = level.trim().to_string();
    }
    Ok(())
}

/// Load configuration: optional TOML file, then environment, then validation.
pub fn load_config(path: Option<&Path>) -> Result<SignerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => SignerConfig::default(),
    };
    apply_env(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::OwnerPolicy;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SignerConfig::default();
        apply_env(
            &mut config,
            env(&[
                (ENV_SIGNER_SECRET, "s3cret"),
                (ENV_PRIVATE_KEY, " abcd "),
                (ENV_NODE_BASE, "https://api.trongrid.io"),
                (ENV_PORT, "8080"),
                (ENV_FEE_LIMIT, "150000000"),
                (ENV_OWNER_POLICY, "enforce"),
            ]),
        )
        .unwrap();

        assert_eq!(config.signer_secret.as_ref().unwrap().expose(), "s3cret");
        assert_eq!(config.private_key.as_ref().unwrap().expose(), "abcd");
        assert_eq!(config.node.base_url, "https://api.trongrid.io");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.signing.fee_limit_sun, 150_000_000);
        assert_eq!(config.signing.owner_policy, OwnerPolicy::Enforce);
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = SignerConfig::default();
        apply_env(&mut config, env(&[(ENV_SIGNER_SECRET, "   ")])).unwrap();
        assert!(config.signer_secret.is_none());
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = SignerConfig::default();
        let err = apply_env(&mut config, env(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_PORT, .. }));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:4000"

            [node]
            base_url = "http://localhost:8090"
            timeout_secs = 3
            "#
        )
        .unwrap();

        let config = load_file(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.node.base_url, "http://localhost:8090");
        assert_eq!(config.node.timeout_secs, 3);
    }
}
