//! Session token claims.

use serde::{Deserialize, Serialize};

/// Claims embedded in the signed session cookie.
///
/// Never carries privilege: the role is looked up from the identity record on
/// every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// External subject identifier.
    pub open_id: String,
    /// Application the session was issued for.
    pub app_id: String,
    /// Display name at sign-in time.
    pub name: String,
    /// Expiry (unix timestamp, seconds).
    pub exp: i64,
}
