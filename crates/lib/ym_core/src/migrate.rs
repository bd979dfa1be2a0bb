//! Database migration support.
//!
//! Embeds and runs SQL migrations from `ym_core/migrations/`. Only the tables
//! owned by the admin backend are migrated; the business schema is external.

use sqlx::PgPool;

/// Run all embedded database migrations against the given pool.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
