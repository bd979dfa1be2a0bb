//! Session cookie construction.

use axum::http::{HeaderMap, Uri};
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use ym_core::session::{COOKIE_NAME, ONE_YEAR_SECS};

/// Build the httpOnly session cookie (one year).
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME.to_string(), token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::None)
        .path("/".to_string())
        .max_age(Duration::seconds(ONE_YEAR_SECS))
        .build()
}

/// Build an expired session cookie to clear the session.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME.to_string(), String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::None)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Whether the request reached us over HTTPS, directly or through a proxy
/// that reports it in `x-forwarded-proto`.
pub fn is_secure_request(headers: &HeaderMap, uri: &Uri) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }
    headers
        .get_all("x-forwarded-proto")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
