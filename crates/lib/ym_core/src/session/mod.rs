//! Signed session tokens carried in the `app_session_id` cookie.

pub mod jwt;

/// Cookie holding the signed session token.
pub const COOKIE_NAME: &str = "app_session_id";

/// Default session lifetime: one year, in seconds.
pub const ONE_YEAR_SECS: i64 = 365 * 24 * 60 * 60;
