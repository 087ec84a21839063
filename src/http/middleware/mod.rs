//! Request middleware.
//!
//! ```text
//! request → client_addr (attach ClientAddr) → guard (403 or forward) → handler
//! ```

pub mod client_addr;
pub mod guard;

pub use client_addr::{client_addr_middleware, shared_resolver, ClientAddr, SharedResolver};
pub use guard::{
    client_guard_middleware, ClientGuard, GuardPolicy, DEFAULT_BOT_MESSAGE,
    DEFAULT_BROWSER_MESSAGE,
};
