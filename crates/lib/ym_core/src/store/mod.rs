//! Datastore access layer over the business schema.
//!
//! Each concern is a narrow trait returning `Result<_, StoreError>`;
//! [`PgStore`] implements all of them against one shared pool. Business rows
//! are returned as opaque JSON objects aggregated in the database with
//! `json_agg`, so column sets can evolve without touching this crate.
//!
//! Statements that touch more than one table run inside a transaction.

pub mod audit;
pub mod console;
pub mod explorer;
pub mod feeds;
pub mod notifications;
pub mod security;
pub mod settings;
pub mod users;
pub mod withdrawals;

use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

pub use audit::AuditStore;
pub use console::{PgConsole, SqlConsole};
pub use explorer::ExplorerStore;
pub use feeds::{Catalog, Feed, FeedStore};
pub use notifications::NotificationStore;
pub use security::SecurityStore;
pub use settings::SettingsStore;
pub use users::{USER_DEPENDENT_TABLES, UserStore};
pub use withdrawals::WithdrawalStore;

/// Datastore errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Unexpected result shape: {0}")]
    Shape(String),
}

/// Every store concern the admin API needs, as one object-safe bound.
pub trait AdminStore:
    UserStore
    + WithdrawalStore
    + SettingsStore
    + NotificationStore
    + SecurityStore
    + FeedStore
    + AuditStore
    + ExplorerStore
{
}

impl<T> AdminStore for T where
    T: UserStore
        + WithdrawalStore
        + SettingsStore
        + NotificationStore
        + SecurityStore
        + FeedStore
        + AuditStore
        + ExplorerStore
{
}

/// Postgres implementation of the business-schema stores.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Wrap a row-returning statement so the database aggregates it into one
/// JSON array.
pub(crate) fn json_rows_sql(sql: &str) -> String {
    let inner = sql.trim().trim_end_matches(';').trim_end();
    format!("SELECT COALESCE(json_agg(t), '[]'::json) FROM ({inner}) t")
}

/// Unpack the aggregated array produced by [`json_rows_sql`].
pub(crate) fn into_rows(value: Value) -> Result<Vec<Value>, StoreError> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other => Err(StoreError::Shape(format!("expected JSON array, got {other}"))),
    }
}

/// Run a row-returning statement bound only by its `LIMIT $1`.
pub(crate) async fn fetch_limited(
    pool: &PgPool,
    sql: &str,
    limit: i64,
) -> Result<Vec<Value>, StoreError> {
    let wrapped = json_rows_sql(sql);
    let value = sqlx::query_scalar::<_, Value>(&wrapped)
        .bind(limit)
        .fetch_one(pool)
        .await?;
    into_rows(value)
}
