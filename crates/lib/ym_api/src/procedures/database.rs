//! `database.*`: schema explorer and the optional SQL console.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use ym_core::models::audit::AdminAction;
use ym_core::store::{ExplorerStore, SqlConsole};

use super::NoInput;
use crate::AppState;
use crate::rpc::validate::require_non_empty;
use crate::rpc::{
    AccessTier, Capability, Context, FieldIssue, Procedure, RpcCode, RpcError, RpcResult,
    Validate,
};
use crate::services::audit;
use crate::services::datastore::or_default;

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        Procedure::query("database.tables", AccessTier::Admin, tables),
        Procedure::query("database.describe", AccessTier::Admin, describe),
        Procedure::mutation("database.query", AccessTier::Admin, query)
            .with_capability(Capability::SqlConsole),
        Procedure::mutation("database.execute", AccessTier::Admin, execute)
            .with_capability(Capability::SqlConsole),
    ]
}

async fn tables(state: AppState, _ctx: Context, _input: NoInput) -> RpcResult<Vec<Value>> {
    Ok(or_default("database.tables", state.store.list_tables().await))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DescribeInput {
    table: String,
}

impl Validate for DescribeInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_empty(&mut issues, "table", &self.table);
        issues
    }
}

async fn describe(state: AppState, _ctx: Context, input: DescribeInput) -> RpcResult<Vec<Value>> {
    Ok(or_default(
        "database.describe",
        state.store.describe_table(input.table.trim()).await,
    ))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SqlInput {
    sql: String,
    #[serde(default)]
    params: Vec<Value>,
}

impl Validate for SqlInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_empty(&mut issues, "sql", &self.sql);
        issues
    }
}

/// Whether a statement may go through `database.query`.
pub fn is_select(sql: &str) -> bool {
    sql.trim().to_lowercase().starts_with("select")
}

fn console(state: &AppState) -> RpcResult<&dyn SqlConsole> {
    state
        .console
        .as_deref()
        .ok_or_else(|| RpcError::new(RpcCode::Forbidden, "SQL console is disabled"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    rows: Vec<Value>,
    row_count: usize,
}

/// Runs a read-only statement exactly as submitted, binding `params` to
/// `$1..$n`.
async fn query(state: AppState, _ctx: Context, input: SqlInput) -> RpcResult<QueryResult> {
    if !is_select(&input.sql) {
        return Err(RpcError::bad_request("Only SELECT queries are allowed"));
    }
    let rows = console(&state)?
        .select(&input.sql, &input.params)
        .await
        .map_err(|e| {
            warn!("console query failed: {e}");
            RpcError::bad_request(e.to_string())
        })?;
    Ok(QueryResult {
        row_count: rows.len(),
        rows,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResult {
    success: bool,
    rows_affected: u64,
}

async fn execute(state: AppState, ctx: Context, input: SqlInput) -> RpcResult<ExecuteResult> {
    let rows_affected = console(&state)?
        .execute(&input.sql, &input.params)
        .await
        .map_err(|e| {
            warn!("console statement failed: {e}");
            RpcError::bad_request(e.to_string())
        })?;
    audit::record(
        &state,
        &ctx,
        AdminAction::ExecuteSql,
        None,
        audit::sql_executed(&input.sql),
    )
    .await;
    Ok(ExecuteResult {
        success: true,
        rows_affected,
    })
}
