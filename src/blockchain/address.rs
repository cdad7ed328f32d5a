//! TRON account addresses.
//!
//! A TRON address is 21 bytes: the `0x41` network prefix followed by the same
//! 20-byte body an EVM address uses (last 20 bytes of keccak256 of the public
//! key). Its user-facing form is base58check (`T...`); nodes also accept the
//! hex form (`41...`).

use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Network prefix byte of every mainnet/testnet TRON address.
pub const ADDRESS_PREFIX: u8 = 0x41;

/// Length of a decoded address, prefix included.
pub const ADDRESS_LEN: usize = 21;

/// Errors raised while parsing an address string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("invalid base58check encoding: {0}")]
    Base58(String),

    #[error("invalid hex encoding: {0}")]
    Hex(String),

    #[error("decoded address has {0} bytes, expected 21")]
    Length(usize),

    #[error("address prefix 0x{0:02x} is not a TRON address prefix")]
    Prefix(u8),
}

/// A canonical 21-byte TRON address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; ADDRESS_LEN]);

impl TronAddress {
    /// Build from raw bytes, checking the prefix.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let raw: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| AddressError::Length(bytes.len()))?;
        if raw[0] != ADDRESS_PREFIX {
            return Err(AddressError::Prefix(raw[0]));
        }
        Ok(Self(raw))
    }

    /// Wrap an EVM-style 20-byte address body.
    pub fn from_evm(address: Address) -> Self {
        let mut raw = [0u8; ADDRESS_LEN];
        raw[0] = ADDRESS_PREFIX;
        raw[1..].copy_from_slice(address.as_slice());
        Self(raw)
    }

    /// The 20-byte body, as used inside ABI-encoded contract parameters.
    pub fn evm(&self) -> Address {
        Address::from_slice(&self.0[1..])
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Base58check form (`T...`).
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    /// Lowercase hex form with the `41` prefix and no `0x`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for TronAddress {
    type Err = AddressError;

    /// Accepts base58check (`T...`), prefixed hex (`41...`, optionally with
    /// `0x`), or a bare 20-byte EVM hex body.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        if s.starts_with('T') {
            let decoded = bs58::decode(s)
                .with_check(Some(ADDRESS_PREFIX))
                .into_vec()
                .map_err(|e| AddressError::Base58(e.to_string()))?;
            return Self::from_bytes(&decoded);
        }

        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let decoded = hex::decode(body).map_err(|e| AddressError::Hex(e.to_string()))?;
        match decoded.len() {
            20 => Ok(Self::from_evm(Address::from_slice(&decoded))),
            _ => Self::from_bytes(&decoded),
        }
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TronAddress({})", self.to_base58())
    }
}

impl Serialize for TronAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for TronAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
