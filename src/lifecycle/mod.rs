//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → broadcast → servers stop accepting and drain
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
