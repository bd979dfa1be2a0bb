//! PIX withdrawals.

use async_trait::async_trait;
use serde_json::Value;

use super::feeds::Feed;
use super::{PgStore, StoreError, fetch_limited, into_rows, json_rows_sql};
use crate::models::business::{NewWithdrawal, StatusTotals, WithdrawalStats, WithdrawalStatus};

#[async_trait]
pub trait WithdrawalStore: Send + Sync {
    async fn list_withdrawals(
        &self,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Value>, StoreError>;

    /// Set the review status, attaching the receipt URL when given.
    async fn update_withdrawal_status(
        &self,
        id: i32,
        status: WithdrawalStatus,
        receipt_url: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn withdrawal_stats(&self) -> Result<WithdrawalStats, StoreError>;

    async fn create_withdrawal(&self, withdrawal: &NewWithdrawal) -> Result<(), StoreError>;
}

const WITHDRAWALS_BY_STATUS_SQL: &str =
    "SELECT w.*, u.name AS user_name, u.email AS user_email \
     FROM withdrawals w LEFT JOIN users u ON w.user_id = u.id \
     WHERE w.status = $2 ORDER BY w.id DESC LIMIT $1";

/// Fold per-status aggregate rows into the fixed three-bucket shape.
pub(crate) fn fold_stats(rows: Vec<(String, i64, f64)>) -> WithdrawalStats {
    let mut stats = WithdrawalStats::default();
    for (status, count, total) in rows {
        let bucket = match status.as_str() {
            "pending" => &mut stats.pending,
            "approved" => &mut stats.approved,
            "rejected" => &mut stats.rejected,
            _ => continue,
        };
        *bucket = StatusTotals { count, total };
    }
    stats
}

#[async_trait]
impl WithdrawalStore for PgStore {
    async fn list_withdrawals(
        &self,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Value>, StoreError> {
        let Some(status) = status.filter(|s| !s.is_empty()) else {
            return fetch_limited(&self.pool, Feed::Withdrawals.sql(), limit).await;
        };
        let wrapped = json_rows_sql(WITHDRAWALS_BY_STATUS_SQL);
        let value = sqlx::query_scalar::<_, Value>(&wrapped)
            .bind(limit)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        into_rows(value)
    }

    async fn update_withdrawal_status(
        &self,
        id: i32,
        status: WithdrawalStatus,
        receipt_url: Option<&str>,
    ) -> Result<(), StoreError> {
        match receipt_url {
            Some(receipt_url) => {
                sqlx::query(
                    "UPDATE withdrawals SET status = $1, receipt_url = $2, updated_at = NOW() WHERE id = $3",
                )
                .bind(status.as_str())
                .bind(receipt_url)
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query("UPDATE withdrawals SET status = $1, updated_at = NOW() WHERE id = $2")
                    .bind(status.as_str())
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn withdrawal_stats(&self) -> Result<WithdrawalStats, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64, f64)>(
            "SELECT status::text, COUNT(*), COALESCE(SUM(amount), 0)::float8 \
             FROM withdrawals WHERE status IN ('pending', 'approved', 'rejected') \
             GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(fold_stats(rows))
    }

    async fn create_withdrawal(&self, withdrawal: &NewWithdrawal) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO withdrawals (user_id, amount, pix_type, pix_key, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW())",
        )
        .bind(withdrawal.user_id)
        .bind(withdrawal.amount)
        .bind(&withdrawal.pix_type)
        .bind(&withdrawal.pix_key)
        .bind(&withdrawal.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
