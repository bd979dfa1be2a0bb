//! Device blacklist and active app sessions.

use async_trait::async_trait;

use super::{PgStore, StoreError};

#[async_trait]
pub trait SecurityStore: Send + Sync {
    async fn add_to_blacklist(&self, device_id: &str, reason: &str) -> Result<(), StoreError>;

    async fn remove_from_blacklist(&self, id: i32) -> Result<(), StoreError>;

    async fn terminate_session(&self, id: i32) -> Result<(), StoreError>;
}

#[async_trait]
impl SecurityStore for PgStore {
    async fn add_to_blacklist(&self, device_id: &str, reason: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO device_blacklist (device_id, reason, created_at) VALUES ($1, $2, NOW())",
        )
        .bind(device_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_from_blacklist(&self, id: i32) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM device_blacklist WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn terminate_session(&self, id: i32) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM active_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
