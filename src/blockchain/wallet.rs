//! Hot wallet holding the signing key.
//!
//! # Security
//! - Private key comes from the environment (or a caller that read it there)
//! - Key is never logged, serialized, or exposed through `Debug`
//! - Only the derived address is ever printed

use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};
use std::fmt;
use thiserror::Error;

use crate::blockchain::address::TronAddress;

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "SIGNER_PRIVATE_KEY";

/// Wallet errors. Messages never contain key material.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("private key not configured ({0} unset or empty)")]
    Missing(&'static str),

    #[error("invalid private key format: {0}")]
    InvalidKey(String),

    #[error("signing primitive failed: {0}")]
    Signing(String),
}

/// Single-key wallet for transaction signing.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    address: TronAddress,
}

impl Wallet {
    /// Create a wallet from a hex-encoded secp256k1 private key.
    ///
    /// # Arguments
    /// * `private_key_hex` - 64 hex characters, with or without `0x`
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        let trimmed = private_key_hex.trim();
        if trimmed.is_empty() {
            return Err(WalletError::Missing(PRIVATE_KEY_ENV_VAR));
        }
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        // The parse error text from the signer crate does not echo input.
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| WalletError::InvalidKey(format!("{}", e)))?;
        let address = TronAddress::from_evm(signer.address());

        tracing::info!(address = %address, "Wallet initialized");

        Ok(Self { signer, address })
    }

    /// Load wallet from `SIGNER_PRIVATE_KEY`.
    pub fn from_env() -> Result<Self, WalletError> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR)
            .map_err(|_| WalletError::Missing(PRIVATE_KEY_ENV_VAR))?;
        Self::from_private_key(&private_key)
    }

    /// Address derived from the held key.
    pub fn address(&self) -> TronAddress {
        self.address
    }

    /// Sign a 32-byte digest. Pure computation, no I/O.
    ///
    /// Returns a recoverable signature; `as_bytes()` yields `r || s || v`
    /// with `v` in {27, 28}, the form TRON nodes accept.
    pub fn sign_digest(&self, digest: B256) -> Result<Signature, WalletError> {
        self.signer
            .sign_hash_sync(&digest)
            .map_err(|e| WalletError::Signing(e.to_string()))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
