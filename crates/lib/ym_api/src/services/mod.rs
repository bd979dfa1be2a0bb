//! Services used by handlers and procedures.

pub mod audit;
pub mod cookies;
pub mod datastore;
pub mod notify;
pub mod oauth;
pub mod session;
