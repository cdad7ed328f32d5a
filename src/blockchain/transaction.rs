//! Unsigned and signed transaction wrappers.
//!
//! # Responsibilities
//! - Pair the node's opaque template with the metadata the signer needs
//! - Compute the signing digest from `raw_data_hex`
//! - Check signature count and form before anything is sent

use alloy::primitives::{Bytes, B256};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::blockchain::address::TronAddress;
use crate::blockchain::types::{Trx, TronTransaction};

/// Expected number of signatures on a single-owner transfer.
pub const REQUIRED_SIGNATURES: usize = 1;

/// Length of a recoverable secp256k1 signature (`r || s || v`).
pub const SIGNATURE_LEN: usize = 65;

/// Which construction path produced a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Native,
    Contract,
}

impl TransferKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferKind::Native => "native",
            TransferKind::Contract => "contract",
        }
    }
}

/// Construction metadata kept next to the node template.
#[derive(Debug, Clone, PartialEq)]
pub enum TxMetadata {
    /// Coin transfer.
    Native { amount: Trx, amount_sun: u64 },
    /// TRC-20 `transfer` invocation.
    Contract {
        contract: TronAddress,
        call_data: Bytes,
        fee_limit_sun: u64,
    },
}

/// Errors in the digest or signature shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureFormError {
    #[error("expected {expected} signature(s), found {found}")]
    Count { expected: usize, found: usize },

    #[error("signature {index} has {len} bytes, expected 65")]
    Length { index: usize, len: usize },

    #[error("signature {index} has recovery byte {v}, expected 27 or 28")]
    RecoveryByte { index: usize, v: u8 },

    #[error("signature {index} has zero r or s component")]
    ZeroComponent { index: usize },
}

/// Transaction ready to be signed. Lives only for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedTransaction {
    owner: TronAddress,
    tx: TronTransaction,
    metadata: TxMetadata,
}

impl UnsignedTransaction {
    pub fn new(owner: TronAddress, tx: TronTransaction, metadata: TxMetadata) -> Self {
        Self { owner, tx, metadata }
    }

    /// Account the transaction spends from.
    pub fn owner(&self) -> TronAddress {
        self.owner
    }

    pub fn tx(&self) -> &TronTransaction {
        &self.tx
    }

    pub fn metadata(&self) -> &TxMetadata {
        &self.metadata
    }

    pub fn kind(&self) -> TransferKind {
        match self.metadata {
            TxMetadata::Native { .. } => TransferKind::Native,
            TxMetadata::Contract { .. } => TransferKind::Contract,
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.tx.tx_id
    }

    /// SHA-256 of the raw transaction bytes. This is the transaction id.
    pub fn digest(&self) -> Result<B256, hex::FromHexError> {
        let raw = hex::decode(self.tx.raw_data_hex.trim())?;
        Ok(B256::from_slice(&Sha256::digest(&raw)))
    }
}

/// Transaction plus its signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    unsigned: UnsignedTransaction,
    signatures: Vec<Vec<u8>>,
}

impl SignedTransaction {
    pub fn new(unsigned: UnsignedTransaction, signatures: Vec<Vec<u8>>) -> Self {
        Self { unsigned, signatures }
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn signatures(&self) -> &[Vec<u8>] {
        &self.signatures
    }

    pub fn tx_id(&self) -> &str {
        self.unsigned.tx_id()
    }

    /// Check the signature set matches what the node will accept.
    pub fn validate(&self) -> Result<(), SignatureFormError> {
        if self.signatures.len() != REQUIRED_SIGNATURES {
            return Err(SignatureFormError::Count {
                expected: REQUIRED_SIGNATURES,
                found: self.signatures.len(),
            });
        }
        for (index, sig) in self.signatures.iter().enumerate() {
            if sig.len() != SIGNATURE_LEN {
                return Err(SignatureFormError::Length { index, len: sig.len() });
            }
            let v = sig[64];
            if v != 27 && v != 28 {
                return Err(SignatureFormError::RecoveryByte { index, v });
            }
            if sig[..32].iter().all(|b| *b == 0) || sig[32..64].iter().all(|b| *b == 0) {
                return Err(SignatureFormError::ZeroComponent { index });
            }
        }
        Ok(())
    }

    /// JSON body for `/wallet/broadcasttransaction`.
    pub fn wire(&self) -> SignedWire<'_> {
        SignedWire {
            tx_id: &self.unsigned.tx.tx_id,
            raw_data: &self.unsigned.tx.raw_data,
            raw_data_hex: &self.unsigned.tx.raw_data_hex,
            signature: self.signatures.iter().map(hex::encode).collect(),
            visible: self.unsigned.tx.visible,
        }
    }
}

/// Serialized form of a signed transaction.
#[derive(Debug, Serialize)]
pub struct SignedWire<'a> {
    #[serde(rename = "txID")]
    pub tx_id: &'a str,
    pub raw_data: &'a serde_json::Value,
    pub raw_data_hex: &'a str,
    pub signature: Vec<String>,
    pub visible: bool,
}
