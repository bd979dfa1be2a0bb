//! OAuth callback: completes sign-in and sets the session cookie.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::cookies::{is_secure_request, session_cookie};
use crate::services::session::{LoginError, complete_login};

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// `GET /api/oauth/callback`: exchange the code, upsert the identity,
/// set the session cookie and redirect to `/`.
pub async fn oauth_callback_handler(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackParams>,
    headers: HeaderMap,
    uri: Uri,
) -> AppResult<Response> {
    let (Some(code), Some(oauth_state)) = (
        params.code.filter(|c| !c.is_empty()),
        params.state.filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::Validation("code and state are required".into()));
    };

    let token = match complete_login(&state, &code, &oauth_state).await {
        Ok(token) => token,
        Err(LoginError::MissingOpenId) => {
            return Err(AppError::Validation("openId missing from user info".into()));
        }
        Err(e) => {
            error!("OAuth callback failed: {e}");
            return Err(AppError::Internal("OAuth callback failed".into()));
        }
    };

    let jar = CookieJar::new().add(session_cookie(&token, is_secure_request(&headers, &uri)));
    Ok((jar, (StatusCode::FOUND, [(header::LOCATION, "/")])).into_response())
}
