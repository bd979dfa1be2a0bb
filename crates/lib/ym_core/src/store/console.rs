//! Free-text SQL pass-through for the database console.
//!
//! Kept apart from the other stores: a [`PgConsole`] only exists when the
//! console capability is switched on.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};

use super::{StoreError, into_rows, json_rows_sql};

#[async_trait]
pub trait SqlConsole: Send + Sync {
    /// Run a row-returning statement with positional parameters.
    async fn select(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, StoreError>;

    /// Run any statement. Returns the affected row count.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, StoreError>;
}

/// Console over the shared pool.
#[derive(Clone)]
pub struct PgConsole {
    pool: PgPool,
}

impl PgConsole {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Bind JSON parameters by their natural SQL type.
fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.as_str()),
            other => query.bind(sqlx::types::Json(other)),
        };
    }
    query
}

#[async_trait]
impl SqlConsole for PgConsole {
    async fn select(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, StoreError> {
        let wrapped = json_rows_sql(sql);
        let row: PgRow = bind_params(sqlx::query(&wrapped), params)
            .fetch_one(&self.pool)
            .await?;
        let value: Value = row.try_get(0)?;
        into_rows(value)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, StoreError> {
        let result = bind_params(sqlx::query(sql), params)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
