//! User-Agent classification subsystem.
//!
//! # Data Flow
//! ```text
//! User-Agent header
//!     → classifier.rs (lowercase, empty check, category precedence)
//!     → registry.rs (substring containment per category)
//!     → bool verdict (or ClientKind for diagnostics)
//!
//! Admin calls:
//!     → registry.rs add / remove / snapshot
//! ```
//!
//! # Design Decisions
//! - The registry is an owned instance shared via Arc, never a global
//! - Reads are lock-free snapshots; writes swap a new list in atomically
//! - Empty User-Agents fail closed

pub mod classifier;
pub mod patterns;
pub mod registry;

pub use classifier::{ClientClassifier, ClientKind};
pub use registry::{
    PatternCategory, PatternHandle, PatternRegistry, PatternSnapshot, UnknownCategory,
};
