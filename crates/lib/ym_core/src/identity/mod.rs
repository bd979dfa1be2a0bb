//! Identity records and the session authentication errors around them.
//!
//! The record store is behind [`IdentityStore`] so the API layer can be
//! exercised against an in-memory implementation.

pub mod queries;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::identity::{IdentityRecord, IdentityUpsert, Role};

pub use queries::PgIdentityStore;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid session cookie")]
    InvalidSession,

    #[error("User not found: {0}")]
    SyncFailed(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence of identity records, keyed by subject (`open_id`).
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a record by its external subject id.
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<IdentityRecord>, AuthError>;

    /// Insert or partially update a record.
    ///
    /// Only supplied fields are written on conflict; when nothing is
    /// supplied `last_signed_in` is bumped to now.
    async fn upsert(&self, upsert: &IdentityUpsert) -> Result<(), AuthError>;
}

/// Role to write for an upsert.
///
/// An explicit role wins; the configured owner is promoted to admin; anyone
/// else gets `None`, which leaves the insert default (`user`) or the
/// existing role in place.
pub fn resolve_role(explicit: Option<Role>, open_id: &str, owner_open_id: &str) -> Option<Role> {
    if explicit.is_some() {
        return explicit;
    }
    if !owner_open_id.is_empty() && open_id == owner_open_id {
        return Some(Role::Admin);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_role_wins_over_owner() {
        assert_eq!(
            resolve_role(Some(Role::Superadmin), "owner", "owner"),
            Some(Role::Superadmin)
        );
    }

    #[test]
    fn owner_becomes_admin() {
        assert_eq!(resolve_role(None, "owner", "owner"), Some(Role::Admin));
    }

    #[test]
    fn others_keep_default() {
        assert_eq!(resolve_role(None, "someone", "owner"), None);
        assert_eq!(resolve_role(None, "", ""), None);
    }
}
