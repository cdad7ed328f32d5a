//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export NodeConfig from config module to avoid duplication
pub use crate::config::schema::NodeConfig;

/// Base units (sun) per TRX.
pub const SUN_PER_TRX: u64 = 1_000_000;

/// Whole-TRX amount handed to the node for native transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Trx(pub u64);

impl Trx {
    /// Convert sun to whole TRX, truncating toward zero.
    ///
    /// Returns the converted amount and the dropped sub-TRX remainder.
    pub fn from_sun_truncating(sun: u64) -> (Self, u64) {
        (Self(sun / SUN_PER_TRX), sun % SUN_PER_TRX)
    }

    /// Convert back to sun. Saturates at `u64::MAX`.
    pub fn to_sun(self) -> u64 {
        self.0.saturating_mul(SUN_PER_TRX)
    }
}

/// A transaction template as returned by the node (`visible: true` form).
///
/// `raw_data` is kept opaque; the node owns the binary encoding and only
/// `raw_data_hex` is hashed for signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TronTransaction {
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub raw_data: serde_json::Value,
    pub raw_data_hex: String,
    #[serde(default)]
    pub visible: bool,
}

/// Node reply to a broadcast submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BroadcastReply {
    #[serde(default)]
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Errors that can occur while talking to the node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Client could not be constructed from configuration.
    #[error("node client configuration invalid: {0}")]
    Config(String),

    /// Connection failed or the node answered with a non-success status.
    #[error("node transport error: {0}")]
    Transport(String),

    /// Node request timed out.
    #[error("node timeout after {0} seconds")]
    Timeout(u64),

    /// Node answered but the body could not be understood.
    #[error("malformed node response: {0}")]
    Malformed(String),

    /// Node understood the request and refused it.
    #[error("node refused request: {0}")]
    Refused(String),
}

impl NodeError {
    /// True when the node was never reached or its answer was unusable.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NodeError::Config(_) | NodeError::Transport(_) | NodeError::Timeout(_) | NodeError::Malformed(_)
        )
    }
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Node error messages are frequently hex-encoded UTF-8. Decode those, pass
/// anything else through verbatim.
pub fn decode_node_message(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() || trimmed.len() % 2 != 0 {
        return message.to_string();
    }
    match hex::decode(trimmed) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) if !text.chars().any(|c| c.is_control() && c != '\n') => text,
            _ => message.to_string(),
        },
        Err(_) => message.to_string(),
    }
}
