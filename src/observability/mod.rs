//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, request ID via TraceLayer span)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON, see logging.rs)
//!     → Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
