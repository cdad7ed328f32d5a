//! Startup orchestration.
//!
//! # Responsibilities
//! - Refuse to start without a shared secret or a private key
//! - Initialize subsystems in dependency order (wallet, node, pipeline)
//! - Hand the assembled state to the HTTP layer
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, but returned, not exited on;
//!   `main` decides what to do with it
//! - The node client can be injected, so tests run the real pipeline
//!   against a double

use std::sync::Arc;
use thiserror::Error;

use crate::auth::Authenticator;
use crate::blockchain::client::{NodeClient, TronGridClient};
use crate::blockchain::types::NodeError;
use crate::blockchain::wallet::{Wallet, WalletError};
use crate::config::{validate_config, ConfigError, SignerConfig};
use crate::http::response::ResponseFormatter;
use crate::http::server::AppState;
use crate::signing::pipeline::SigningPipeline;

/// Why the service cannot start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("signer secret is not configured (SIGNER_SECRET)")]
    MissingSecret,

    #[error("private key is not configured (SIGNER_PRIVATE_KEY)")]
    MissingPrivateKey,

    #[error("wallet initialization failed: {0}")]
    Wallet(#[from] WalletError),

    #[error("node client initialization failed: {0}")]
    Node(#[from] NodeError),
}

/// Check a loaded configuration. Credentials are checked first so their
/// absence has its own error.
pub fn validate(config: &SignerConfig) -> Result<(), StartupError> {
    if config.signer_secret.as_ref().map_or(true, |s| s.is_blank()) {
        return Err(StartupError::MissingSecret);
    }
    if config.private_key.as_ref().map_or(true, |s| s.is_blank()) {
        return Err(StartupError::MissingPrivateKey);
    }
    validate_config(config).map_err(|violations| StartupError::Config(ConfigError::Validation(violations)))
}

/// Build the application state with a TronGrid client.
pub fn build_state(config: &SignerConfig) -> Result<AppState, StartupError> {
    validate(config)?;
    let node: Arc<dyn NodeClient> = Arc::new(TronGridClient::new(config.node.clone())?);
    assemble(config, node)
}

/// Build the application state around an existing node client.
pub fn assemble(config: &SignerConfig, node: Arc<dyn NodeClient>) -> Result<AppState, StartupError> {
    validate(config)?;

    let secret = config.signer_secret.as_ref().ok_or(StartupError::MissingSecret)?;
    let auth = Authenticator::new(secret.expose()).map_err(|_| StartupError::MissingSecret)?;

    let key = config.private_key.as_ref().ok_or(StartupError::MissingPrivateKey)?;
    let wallet = Arc::new(Wallet::from_private_key(key.expose())?);

    tracing::info!(
        signer = %wallet.address(),
        node = %config.node.base_url,
        fee_limit_sun = config.signing.fee_limit_sun,
        owner_policy = ?config.signing.owner_policy,
        "Signer initialized"
    );

    let pipeline = SigningPipeline::new(auth, node.clone(), wallet, &config.signing);
    Ok(AppState {
        pipeline: Arc::new(pipeline),
        node,
        formatter: Arc::new(ResponseFormatter::from_config(config)),
    })
}
