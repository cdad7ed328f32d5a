//! TRON ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key, node URL)
//!     → wallet.rs (key loading, digest signing)
//!     → address.rs (base58check / hex account ids)
//!     → abi.rs (TRC-20 transfer call data)
//!     → client.rs (node templates + broadcast, with timeouts)
//!     → transaction.rs (unsigned/signed wrappers, digest, signature form)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All node calls have configurable timeouts

pub mod abi;
pub mod address;
pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use address::TronAddress;
pub use client::{ContractCall, NodeClient, TronGridClient};
pub use transaction::{SignedTransaction, TransferKind, TxMetadata, UnsignedTransaction};
pub use types::{BroadcastReply, NodeConfig, NodeError, TronTransaction, Trx};
pub use wallet::Wallet;
