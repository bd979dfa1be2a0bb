//! Schema introspection for the database explorer page.

use async_trait::async_trait;
use serde_json::Value;

use super::{PgStore, StoreError, into_rows, json_rows_sql};

#[async_trait]
pub trait ExplorerStore: Send + Sync {
    /// Base tables of the `public` schema.
    async fn list_tables(&self) -> Result<Vec<Value>, StoreError>;

    /// Column layout of one `public` table; empty when it does not exist.
    async fn describe_table(&self, table: &str) -> Result<Vec<Value>, StoreError>;
}

const LIST_TABLES_SQL: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name";

const DESCRIBE_TABLE_SQL: &str =
    "SELECT column_name, data_type, is_nullable, column_default, character_maximum_length \
     FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position";

#[async_trait]
impl ExplorerStore for PgStore {
    async fn list_tables(&self) -> Result<Vec<Value>, StoreError> {
        let wrapped = json_rows_sql(LIST_TABLES_SQL);
        let value = sqlx::query_scalar::<_, Value>(&wrapped)
            .fetch_one(&self.pool)
            .await?;
        into_rows(value)
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<Value>, StoreError> {
        let wrapped = json_rows_sql(DESCRIBE_TABLE_SQL);
        let value = sqlx::query_scalar::<_, Value>(&wrapped)
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
        into_rows(value)
    }
}
