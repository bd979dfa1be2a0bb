//! Session token signing and verification.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use crate::identity::AuthError;
use crate::models::session::SessionClaims;

/// Sign a session token (HS256) expiring `lifetime_secs` from now.
pub fn sign_session(
    open_id: &str,
    app_id: &str,
    name: &str,
    lifetime_secs: i64,
    secret: &[u8],
) -> Result<String, AuthError> {
    let claims = SessionClaims {
        open_id: open_id.to_string(),
        app_id: app_id.to_string(),
        name: name.to_string(),
        exp: (Utc::now() + Duration::seconds(lifetime_secs)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify a session token, returning the claims on success.
///
/// Returns `None` for malformed tokens, bad signatures, expired tokens and
/// tokens whose `openId` or `appId` is empty.
pub fn verify_session(token: &str, secret: &[u8]) -> Option<SessionClaims> {
    if token.is_empty() {
        return None;
    }
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);
    let claims = decode::<SessionClaims>(token, &key, &validation)
        .ok()?
        .claims;
    if claims.open_id.is_empty() || claims.app_id.is_empty() {
        return None;
    }
    Some(claims)
}

/// Resolve the session secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_session_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = session_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new session secret");
    secret
}

fn session_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("youngmoney-admin")
        .join("session-secret")
}
