//! Client address subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → resolver.rs (trusted edge headers → X-Real-IP → X-Forwarded-For → peer)
//!     → ClientAddr (unvalidated string)
//!     → classify.rs (is_valid / is_private, on demand)
//! ```
//!
//! # Design Decisions
//! - Resolution never validates; validity is a separate question
//! - Header trust is a deployment decision, expressed as the resolver's header list
//! - Nothing here holds shared mutable state

pub mod classify;
pub mod resolver;

pub use classify::{is_private, is_valid};
pub use resolver::{
    split_host_port, AddressResolver, HeaderFormat, HeaderSource, TrustedHeader,
    DEFAULT_TRUSTED_HEADERS,
};
