//! # ym_core
//!
//! Core domain logic for the Young Money admin backend: the datastore access
//! layer, the identity store, session tokens and audit log types.

pub mod identity;
pub mod migrate;
pub mod models;
pub mod session;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
