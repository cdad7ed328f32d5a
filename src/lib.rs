//! TRON transaction signing service library.

pub mod auth;
pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod signing;

pub use config::schema::SignerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use signing::{SignOutcome, SignerError, SigningPipeline};
