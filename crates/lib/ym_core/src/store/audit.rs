//! Append-only admin action log.

use async_trait::async_trait;

use super::{PgStore, StoreError};
use crate::models::audit::NewAdminLogEntry;

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_admin_log(&self, entry: &NewAdminLogEntry) -> Result<(), StoreError>;
}

#[async_trait]
impl AuditStore for PgStore {
    async fn insert_admin_log(&self, entry: &NewAdminLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO admin_logs (admin_id, action, target_type, target_id, details, ip_address, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW())",
        )
        .bind(entry.actor_id)
        .bind(entry.action.as_str())
        .bind(entry.target_type)
        .bind(entry.target_id)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
