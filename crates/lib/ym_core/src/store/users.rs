//! App users, their points and balances, and point transaction history.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::feeds::Feed;
use super::{PgStore, StoreError, fetch_limited, into_rows, json_rows_sql};
use crate::models::business::{DashboardStats, PointsOperation};

/// Tables holding rows that reference `users`, in deletion order.
pub const USER_DEPENDENT_TABLES: [&str; 4] =
    ["withdrawals", "point_transactions", "referrals", "daily_tasks"];

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Page of users, newest first, optionally filtered by name/email.
    async fn list_users(
        &self,
        limit: i64,
        offset: i64,
        search: Option<&str>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn count_users(&self, search: Option<&str>) -> Result<i64, StoreError>;

    async fn get_user(&self, id: i32) -> Result<Option<Value>, StoreError>;

    async fn update_points(
        &self,
        id: i32,
        operation: PointsOperation,
        points: i64,
    ) -> Result<(), StoreError>;

    async fn update_balance(&self, id: i32, balance: f64) -> Result<(), StoreError>;

    /// Blacklist the user's device. Returns whether a device was on file.
    async fn ban_user(&self, id: i32, reason: &str) -> Result<bool, StoreError>;

    /// Delete every user and the rows that reference them. Returns the
    /// number of users removed.
    async fn delete_all_users(&self) -> Result<u64, StoreError>;

    async fn list_user_ids(&self) -> Result<Vec<i32>, StoreError>;

    async fn point_transactions(
        &self,
        user_id: Option<i32>,
        limit: i64,
    ) -> Result<Vec<Value>, StoreError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError>;
}

const LIST_USERS_SQL: &str = "SELECT * FROM users \
     WHERE ($3::text IS NULL OR name ILIKE $3 ESCAPE '\\' OR email ILIKE $3 ESCAPE '\\') \
     ORDER BY id DESC LIMIT $1 OFFSET $2";

const COUNT_USERS_SQL: &str = "SELECT COUNT(*) FROM users \
     WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\\' OR email ILIKE $1 ESCAPE '\\')";

const USER_POINT_TRANSACTIONS_SQL: &str =
    "SELECT pt.*, u.name AS user_name, u.email AS user_email \
     FROM point_transactions pt LEFT JOIN users u ON pt.user_id = u.id \
     WHERE pt.user_id = $2 ORDER BY pt.id DESC LIMIT $1";

const DASHBOARD_STATS_SQL: &str = "SELECT \
     (SELECT COUNT(*) FROM users) AS total_users, \
     (SELECT COALESCE(SUM(points), 0)::bigint FROM users) AS total_points, \
     (SELECT COALESCE(SUM(balance), 0)::float8 FROM users) AS total_balance, \
     (SELECT COUNT(*) FROM withdrawals WHERE status = 'pending') AS pending_withdrawals, \
     (SELECT COALESCE(SUM(amount), 0)::float8 FROM withdrawals WHERE status = 'pending') \
        AS pending_withdrawals_amount, \
     (SELECT COALESCE(SUM(amount), 0)::float8 FROM withdrawals WHERE status = 'approved') \
        AS total_withdrawn, \
     (SELECT COUNT(*) FROM users WHERE last_login_at::date = CURRENT_DATE) AS active_users_today";

/// `ILIKE` pattern for a free-text search, or `None` when blank.
///
/// Wildcards typed by the caller match literally (`ESCAPE '\'`).
pub(crate) fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search?.trim();
    if term.is_empty() {
        return None;
    }
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Some(format!("%{escaped}%"))
}

/// Statement applying a points change; `$1` is the amount, `$2` the user id.
pub(crate) fn points_sql(operation: PointsOperation) -> &'static str {
    match operation {
        PointsOperation::Add => {
            "UPDATE users SET points = points + $1, updated_at = NOW() WHERE id = $2"
        }
        PointsOperation::Subtract => {
            "UPDATE users SET points = points - $1, updated_at = NOW() WHERE id = $2"
        }
        PointsOperation::Set => "UPDATE users SET points = $1, updated_at = NOW() WHERE id = $2",
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn list_users(
        &self,
        limit: i64,
        offset: i64,
        search: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let wrapped = json_rows_sql(LIST_USERS_SQL);
        let value = sqlx::query_scalar::<_, Value>(&wrapped)
            .bind(limit)
            .bind(offset)
            .bind(search_pattern(search))
            .fetch_one(&self.pool)
            .await?;
        into_rows(value)
    }

    async fn count_users(&self, search: Option<&str>) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(COUNT_USERS_SQL)
            .bind(search_pattern(search))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn get_user(&self, id: i32) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query_scalar::<_, Value>("SELECT row_to_json(u) FROM users u WHERE u.id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_points(
        &self,
        id: i32,
        operation: PointsOperation,
        points: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(points_sql(operation))
            .bind(points)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_balance(&self, id: i32, balance: f64) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET balance = $1 WHERE id = $2")
            .bind(balance)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ban_user(&self, id: i32, reason: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let device_id = sqlx::query_scalar::<_, Option<String>>(
            "SELECT device_id::text FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .flatten()
        .filter(|device| !device.is_empty());

        let Some(device_id) = device_id else {
            tx.commit().await?;
            return Ok(false);
        };
        sqlx::query(
            "INSERT INTO device_blacklist (device_id, reason, created_at) VALUES ($1, $2, NOW())",
        )
        .bind(&device_id)
        .bind(reason)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete_all_users(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        for table in USER_DEPENDENT_TABLES {
            let removed = sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?
                .rows_affected();
            info!(table, removed, "cleared user-dependent table");
        }
        let count = sqlx::query("DELETE FROM users")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        info!(count, "deleted all users");
        Ok(count)
    }

    async fn list_user_ids(&self) -> Result<Vec<i32>, StoreError> {
        let ids = sqlx::query_scalar::<_, i32>("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn point_transactions(
        &self,
        user_id: Option<i32>,
        limit: i64,
    ) -> Result<Vec<Value>, StoreError> {
        let Some(user_id) = user_id else {
            return fetch_limited(&self.pool, Feed::PointTransactions.sql(), limit).await;
        };
        let wrapped = json_rows_sql(USER_POINT_TRANSACTIONS_SQL);
        let value = sqlx::query_scalar::<_, Value>(&wrapped)
            .bind(limit)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        into_rows(value)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let stats = sqlx::query_as::<_, DashboardStats>(DASHBOARD_STATS_SQL)
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }
}
