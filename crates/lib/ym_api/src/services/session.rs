//! Session authentication and OAuth sign-in.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use ym_core::identity::{AuthError, resolve_role};
use ym_core::models::identity::{IdentityRecord, IdentityUpsert};
use ym_core::session::ONE_YEAR_SECS;
use ym_core::session::jwt::{sign_session, verify_session};

use crate::AppState;
use crate::services::oauth::{OAuthError, ProviderUser};

/// OAuth callback failures.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("openId missing from user info")]
    MissingOpenId,

    #[error(transparent)]
    OAuth(#[from] OAuthError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Upsert writing a provider profile, with the owner promoted to admin.
pub fn provision_upsert(
    user: &ProviderUser,
    owner_open_id: &str,
    at: DateTime<Utc>,
) -> IdentityUpsert {
    IdentityUpsert {
        open_id: user.open_id.clone(),
        name: Some(user.name.clone().filter(|n| !n.is_empty())),
        email: Some(user.email.clone()),
        login_method: Some(user.login_method.clone().or_else(|| user.platform.clone())),
        role: resolve_role(None, &user.open_id, owner_open_id),
        last_signed_in: Some(at),
    }
}

/// Resolve the identity behind a session token.
///
/// Known subjects get `last_signed_in` refreshed; unknown subjects are
/// provisioned from the identity provider. Exactly one upsert per call.
pub async fn authenticate_request(
    state: &AppState,
    token: Option<&str>,
) -> Result<IdentityRecord, AuthError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::InvalidSession)?;
    let claims = verify_session(token, state.config.session_secret.as_bytes())
        .ok_or(AuthError::InvalidSession)?;
    let now = Utc::now();

    if let Some(existing) = state.identities.find_by_open_id(&claims.open_id).await? {
        state
            .identities
            .upsert(&IdentityUpsert::touch(&existing.open_id, now))
            .await?;
        return Ok(IdentityRecord {
            last_signed_in: now,
            ..existing
        });
    }

    debug!(open_id = %claims.open_id, "unknown subject, syncing from identity provider");
    let user = state
        .provider
        .user_info_with_jwt(token)
        .await
        .map_err(|e| AuthError::SyncFailed(format!("failed to sync user info: {e}")))?;
    if user.open_id.is_empty() {
        return Err(AuthError::SyncFailed("provider returned no openId".into()));
    }
    state
        .identities
        .upsert(&provision_upsert(&user, &state.config.owner_open_id, now))
        .await
        .map_err(|e| AuthError::SyncFailed(e.to_string()))?;
    state
        .identities
        .find_by_open_id(&user.open_id)
        .await
        .map_err(|e| AuthError::SyncFailed(e.to_string()))?
        .ok_or_else(|| AuthError::SyncFailed("user not found after sync".into()))
}

/// Complete an OAuth sign-in: exchange the code, provision the identity and
/// sign a session token.
pub async fn complete_login(
    state: &AppState,
    code: &str,
    oauth_state: &str,
) -> Result<String, LoginError> {
    let token = state.provider.exchange_code(code, oauth_state).await?;
    let user = state.provider.user_info(&token.access_token).await?;
    if user.open_id.is_empty() {
        return Err(LoginError::MissingOpenId);
    }
    state
        .identities
        .upsert(&provision_upsert(&user, &state.config.owner_open_id, Utc::now()))
        .await?;
    let session = sign_session(
        &user.open_id,
        &state.config.app_id,
        user.name.as_deref().unwrap_or(""),
        ONE_YEAR_SECS,
        state.config.session_secret.as_bytes(),
    )?;
    info!(open_id = %user.open_id, "signed in");
    Ok(session)
}
