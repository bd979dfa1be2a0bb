//! Postgres-backed identity store (`admin_users`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{AuthError, IdentityStore};
use crate::models::identity::{IdentityRecord, IdentityUpsert, Role};

type IdentityRow = (
    i32,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// Identity store over the shared connection pool.
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<IdentityRecord>, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, open_id, name, email, login_method, role, created_at, updated_at, last_signed_in \
             FROM admin_users WHERE open_id = $1 LIMIT 1",
        )
        .bind(open_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_record).transpose()
    }

    async fn upsert(&self, upsert: &IdentityUpsert) -> Result<(), AuthError> {
        if upsert.open_id.is_empty() {
            return Err(AuthError::Internal("open_id is required for upsert".into()));
        }
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO admin_users (open_id, name, email, login_method, role, last_signed_in) VALUES (",
        );
        {
            let mut values = qb.separated(", ");
            values.push_bind(&upsert.open_id);
            values.push_bind(upsert.name.clone().flatten());
            values.push_bind(upsert.email.clone().flatten());
            values.push_bind(upsert.login_method.clone().flatten());
            values.push_bind(upsert.role.unwrap_or(Role::User).as_str());
            values.push_bind(upsert.last_signed_in.unwrap_or_else(Utc::now));
        }
        qb.push(") ON CONFLICT (open_id) DO UPDATE SET ");
        for column in update_columns(upsert) {
            qb.push(column);
            qb.push(" = EXCLUDED.");
            qb.push(column);
            qb.push(", ");
        }
        qb.push("updated_at = now()");
        qb.build().execute(&self.pool).await?;
        Ok(())
    }
}

/// Columns overwritten when the subject already exists.
pub(crate) fn update_columns(upsert: &IdentityUpsert) -> Vec<&'static str> {
    let mut columns = Vec::new();
    if upsert.name.is_some() {
        columns.push("name");
    }
    if upsert.email.is_some() {
        columns.push("email");
    }
    if upsert.login_method.is_some() {
        columns.push("login_method");
    }
    if upsert.role.is_some() {
        columns.push("role");
    }
    if upsert.last_signed_in.is_some() || columns.is_empty() {
        columns.push("last_signed_in");
    }
    columns
}

fn into_record(row: IdentityRow) -> Result<IdentityRecord, AuthError> {
    let (id, open_id, name, email, login_method, role, created_at, updated_at, last_signed_in) =
        row;
    let role = role.parse::<Role>().map_err(AuthError::Internal)?;
    Ok(IdentityRecord {
        id,
        open_id,
        name,
        email,
        login_method,
        role,
        created_at,
        updated_at,
        last_signed_in,
    })
}
