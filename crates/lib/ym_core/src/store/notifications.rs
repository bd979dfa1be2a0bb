//! In-app notifications for app users.

use async_trait::async_trait;

use super::{PgStore, StoreError};
use crate::models::business::NewNotification;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert the notification and credit its points, atomically.
    async fn create_notification(&self, notification: &NewNotification)
    -> Result<(), StoreError>;
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO notifications (user_id, title, message, type, is_read, created_at) \
             VALUES ($1, $2, $3, $4, false, NOW())",
        )
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.kind)
        .execute(&mut *tx)
        .await?;
        if notification.points > 0 {
            sqlx::query("UPDATE users SET points = points + $1 WHERE id = $2")
                .bind(notification.points)
                .bind(notification.user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
