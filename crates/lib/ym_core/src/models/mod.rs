//! Domain models shared by the store and the API layer.
//!
//! Business rows (app users, withdrawals, notifications, ...) stay opaque JSON
//! objects; only the shapes the admin backend itself interprets are typed here.

pub mod audit;
pub mod business;
pub mod identity;
pub mod session;
