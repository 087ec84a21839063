//! Client identity resolution for HTTP services.
//!
//! Works out the originating address of a request from trusted edge headers
//! and classifies the client software by User-Agent substring rules.

pub mod admin;
pub mod agent;
pub mod config;
pub mod http;
pub mod ip;
pub mod lifecycle;
pub mod observability;

pub use agent::{ClientClassifier, PatternCategory, PatternHandle, PatternRegistry};
pub use config::schema::IdentityConfig;
pub use http::middleware::{ClientAddr, ClientGuard, GuardPolicy};
pub use http::HttpServer;
pub use ip::AddressResolver;
pub use lifecycle::Shutdown;
