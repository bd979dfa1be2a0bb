//! Request handlers.

pub mod oauth;
pub mod trpc;
