//! Session middleware: resolves the caller's identity from the session
//! cookie without ever rejecting the request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;
use ym_core::models::identity::IdentityRecord;
use ym_core::session::COOKIE_NAME;

use crate::AppState;
use crate::services::session::authenticate_request;

/// Identity resolved for the current request; `None` when anonymous.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<IdentityRecord>);

/// Axum middleware: verifies the session cookie, resolves the identity
/// record and injects [`Caller`] into request extensions. Failures degrade
/// to an anonymous caller.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let token = jar.get(COOKIE_NAME).map(|c| c.value().to_string());

    let identity = match authenticate_request(&state, token.as_deref()).await {
        Ok(identity) => Some(identity),
        Err(e) => {
            if token.is_some() {
                debug!("session not accepted, continuing anonymously: {e}");
            }
            None
        }
    };

    request.extensions_mut().insert(Caller(identity));
    next.run(request).await
}
