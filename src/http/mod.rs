//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID, span)
//!     → handlers.rs (liveness, readiness, /sign)
//!     → [signing pipeline]
//!     → response.rs (status mapping, scrubbed JSON)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::ResponseFormatter;
pub use server::{AppState, HttpServer};
