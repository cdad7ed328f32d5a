//! Request → signed, broadcast transaction.
//!
//! # Data Flow
//! ```text
//! raw body + headers
//!     → auth (shared secret)
//!     → request.rs (alias resolution, TransferIntent)
//!     → locks.rs (per-account serialization)
//!     → builder.rs (node template: native or contract)
//!     → signer.rs (digest check, secp256k1 signature)
//!     → broadcaster.rs (submit, accept/reject)
//!     → pipeline.rs (SignOutcome | SignerError)
//! ```

pub mod broadcaster;
pub mod builder;
pub mod error;
pub mod locks;
pub mod pipeline;
pub mod request;
pub mod signer;

pub use broadcaster::{BroadcastResult, Broadcaster, Rejection};
pub use builder::TransactionBuilder;
pub use error::{BroadcastError, BuildError, SignerError, SigningError, Stage, ValidationError};
pub use locks::{AccountGuard, AccountLocks};
pub use pipeline::{RequestState, SignOutcome, SigningPipeline};
pub use request::{normalize, parse_body, ResolvedFields, SigningRequest, TransferIntent};
pub use signer::TxSigner;
