//! Client for the external OAuth identity provider.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use url::Url;

const EXCHANGE_TOKEN_PATH: &str = "webdev.v1.WebDevAuthPublicService/ExchangeToken";
const GET_USER_INFO_PATH: &str = "webdev.v1.WebDevAuthPublicService/GetUserInfo";
const GET_USER_INFO_WITH_JWT_PATH: &str = "webdev.v1.WebDevAuthPublicService/GetUserInfoWithJwt";

/// Identity provider errors.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth server URL is not configured")]
    NotConfigured,

    #[error("Invalid OAuth server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Result of exchanging an authorization code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Canonical profile of a subject as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUser {
    #[serde(default)]
    pub open_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub platforms: Vec<Value>,
    #[serde(default)]
    pub login_method: Option<String>,
}

impl ProviderUser {
    /// Fill `login_method` (and `platform`) from the platform list.
    pub fn with_login_method(mut self) -> Self {
        let platforms: Vec<&str> = self.platforms.iter().filter_map(Value::as_str).collect();
        let method = derive_login_method(&platforms, self.platform.as_deref());
        self.platform = method.clone();
        self.login_method = method;
        self
    }
}

/// Map provider platform tags to a short login method name.
///
/// A non-empty `fallback` wins; unknown tags fall back to the first one,
/// lowercased.
pub fn derive_login_method(platforms: &[&str], fallback: Option<&str>) -> Option<String> {
    if let Some(fallback) = fallback
        && !fallback.is_empty()
    {
        return Some(fallback.to_string());
    }
    let has = |tag: &str| platforms.contains(&tag);
    let method = if has("REGISTERED_PLATFORM_EMAIL") {
        "email"
    } else if has("REGISTERED_PLATFORM_GOOGLE") {
        "google"
    } else if has("REGISTERED_PLATFORM_APPLE") {
        "apple"
    } else if has("REGISTERED_PLATFORM_MICROSOFT") || has("REGISTERED_PLATFORM_AZURE") {
        "microsoft"
    } else if has("REGISTERED_PLATFORM_GITHUB") {
        "github"
    } else {
        return platforms.first().map(|p| p.to_lowercase());
    };
    Some(method.to_string())
}

/// The OAuth `state` parameter is the base64-encoded redirect URI.
pub fn decode_state(state: &str) -> Result<String, OAuthError> {
    let bytes = STANDARD
        .decode(state)
        .or_else(|_| STANDARD_NO_PAD.decode(state))
        .map_err(|_| OAuthError::InvalidState)?;
    String::from_utf8(bytes).map_err(|_| OAuthError::InvalidState)
}

/// Operations the session layer needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenResponse, OAuthError>;

    /// Profile for an OAuth access token.
    async fn user_info(&self, access_token: &str) -> Result<ProviderUser, OAuthError>;

    /// Profile for a session token issued by this application.
    async fn user_info_with_jwt(&self, jwt: &str) -> Result<ProviderUser, OAuthError>;
}

/// HTTP client for the provider's JSON endpoints.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    base_url: Option<Url>,
    app_id: String,
}

impl OAuthClient {
    /// An empty `base_url` yields a client whose calls fail with
    /// [`OAuthError::NotConfigured`].
    pub fn new(base_url: &str, app_id: impl Into<String>) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = if base_url.is_empty() {
            None
        } else if base_url.ends_with('/') {
            Some(Url::parse(base_url)?)
        } else {
            Some(Url::parse(&format!("{base_url}/"))?)
        };
        Ok(Self {
            http,
            base_url,
            app_id: app_id.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, OAuthError> {
        let base = self.base_url.as_ref().ok_or(OAuthError::NotConfigured)?;
        Ok(base.join(path)?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, OAuthError> {
        let url = self.endpoint(path)?;
        debug!(%url, "calling identity provider");
        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OAuthError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl IdentityProvider for OAuthClient {
    async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenResponse, OAuthError> {
        let redirect_uri = decode_state(state)?;
        self.post(
            EXCHANGE_TOKEN_PATH,
            json!({
                "clientId": self.app_id,
                "grantType": "authorization_code",
                "code": code,
                "redirectUri": redirect_uri,
            }),
        )
        .await
    }

    async fn user_info(&self, access_token: &str) -> Result<ProviderUser, OAuthError> {
        let user: ProviderUser = self
            .post(GET_USER_INFO_PATH, json!({ "accessToken": access_token }))
            .await?;
        Ok(user.with_login_method())
    }

    async fn user_info_with_jwt(&self, jwt: &str) -> Result<ProviderUser, OAuthError> {
        let user: ProviderUser = self
            .post(
                GET_USER_INFO_WITH_JWT_PATH,
                json!({ "jwtToken": jwt, "projectId": self.app_id }),
            )
            .await?;
        Ok(user.with_login_method())
    }
}
