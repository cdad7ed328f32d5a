//! Pipeline error taxonomy and request stages.

use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::blockchain::address::AddressError;
use crate::blockchain::transaction::SignatureFormError;
use crate::blockchain::types::NodeError;
use crate::blockchain::wallet::WalletError;
use crate::signing::request::ResolvedFields;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Auth,
    Validation,
    Build,
    Sign,
    Broadcast,
    Internal,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Auth => "auth",
            Stage::Validation => "validation",
            Stage::Build => "build",
            Stage::Sign => "sign",
            Stage::Broadcast => "broadcast",
            Stage::Internal => "internal",
        }
    }
}

/// Request could not be turned into a `SigningRequest`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameters: {}", .missing.join(", "))]
    MissingParameters {
        missing: Vec<&'static str>,
        resolved: ResolvedFields,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: String,
        resolved: ResolvedFields,
    },
}

impl ValidationError {
    /// What the normalizer managed to resolve, safe to echo.
    pub fn resolved(&self) -> &ResolvedFields {
        match self {
            ValidationError::MissingParameters { resolved, .. }
            | ValidationError::InvalidParameter { resolved, .. } => resolved,
        }
    }
}

/// Transaction template could not be produced.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid {field} address: {source}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        source: AddressError,
    },

    #[error("amount of {amount_sun} sun is below one transfer unit (1 TRX)")]
    AmountBelowUnit { amount_sun: u64 },

    #[error("token amount must be greater than zero")]
    ZeroTokenAmount,

    #[error("node could not build transaction: {0}")]
    Node(#[from] NodeError),

    #[error("node returned no transaction object")]
    MissingTransaction,
}

/// Signature could not be produced or is unusable.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("raw transaction is not valid hex: {0}")]
    RawData(String),

    #[error("transaction id {reported} does not match digest {computed}")]
    DigestMismatch { reported: String, computed: String },

    #[error("signing key belongs to {signer}, transaction owner is {owner}")]
    OwnerMismatch { owner: String, signer: String },

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("produced signature is invalid: {0}")]
    InvalidSignature(#[from] SignatureFormError),
}

/// Submission failed.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// Node unreachable or answered with something unusable.
    #[error("transport failure: {0}")]
    Transport(NodeError),

    /// Node parsed the transaction and refused it.
    #[error("node rejected transaction ({code}): {reason}")]
    NodeRejected { code: String, reason: String },

    /// Signature set is not sendable; nothing was sent.
    #[error("signed transaction not sendable: {0}")]
    InvalidSignedTransaction(#[from] SignatureFormError),
}

/// Every way a `/sign` request can fail.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("broadcast failed: {0}")]
    Broadcast(#[from] BroadcastError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SignerError {
    pub fn stage(&self) -> Stage {
        match self {
            SignerError::Auth(_) => Stage::Auth,
            SignerError::Validation(_) => Stage::Validation,
            SignerError::Build(_) => Stage::Build,
            SignerError::Signing(_) => Stage::Sign,
            SignerError::Broadcast(_) => Stage::Broadcast,
            SignerError::Internal(_) => Stage::Internal,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            SignerError::Auth(_) => "invalid_signer_secret",
            SignerError::Validation(ValidationError::MissingParameters { .. }) => "missing_parameters",
            SignerError::Validation(ValidationError::InvalidParameter { .. }) => "invalid_parameters",
            SignerError::Build(_) => "build_failed",
            SignerError::Signing(_) => "signing_failed",
            SignerError::Broadcast(BroadcastError::Transport(_)) => "transport_error",
            SignerError::Broadcast(BroadcastError::NodeRejected { .. }) => "node_rejected",
            SignerError::Broadcast(BroadcastError::InvalidSignedTransaction(_)) => "invalid_signed_transaction",
            SignerError::Internal(_) => "internal_error",
        }
    }

    /// True once a signed transaction was handed to the node, whatever the
    /// outcome. Callers deciding on resubmission must check this.
    pub fn submission_attempted(&self) -> bool {
        matches!(
            self,
            SignerError::Broadcast(BroadcastError::NodeRejected { .. } | BroadcastError::Transport(_))
        )
    }
}
