//! Per-call context handed to every procedure.

use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use axum_extra::extract::cookie::Cookie;
use ym_core::models::identity::IdentityRecord;

/// Cookies a procedure wants set on the HTTP response.
#[derive(Clone, Default)]
pub struct ResponseCookies(Arc<Mutex<Vec<Cookie<'static>>>>);

impl ResponseCookies {
    pub fn push(&self, cookie: Cookie<'static>) {
        let mut cookies = self.0.lock().unwrap_or_else(|e| e.into_inner());
        cookies.push(cookie);
    }

    pub fn take(&self) -> Vec<Cookie<'static>> {
        let mut cookies = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *cookies)
    }
}

/// Request-scoped data available to procedures.
#[derive(Clone, Default)]
pub struct Context {
    /// Resolved identity, `None` for anonymous callers.
    pub caller: Option<IdentityRecord>,
    /// Client address for the audit log.
    pub client_ip: Option<String>,
    /// Whether the request arrived over HTTPS.
    pub secure: bool,
    pub cookies: ResponseCookies,
}

impl Context {
    pub fn caller_id(&self) -> Option<i32> {
        self.caller.as_ref().map(|c| c.id)
    }
}

/// Client address: first `x-forwarded-for` hop, else the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<std::net::SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    match forwarded {
        Some(ip) => Some(ip.to_string()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}
