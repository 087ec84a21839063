//! HTTP surface of the service.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → middleware/client_addr.rs (resolve originating address)
//!     → middleware/guard.rs (User-Agent policy, 403 on rejection)
//!     → /whoami, /health
//! ```

pub mod middleware;
pub mod server;

pub use server::{AppState, HttpServer};
