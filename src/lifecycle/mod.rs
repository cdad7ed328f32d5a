//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Wallet → Node client → Pipeline → AppState
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Wait for detached jobs → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - In-flight broadcasts are never cancelled; shutdown waits for them

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{InFlight, JobGuard, Shutdown};
pub use signals::shutdown_signal;
pub use startup::{assemble, build_state, StartupError};
