//! `appUsers.*` plus the user-centric feeds (`pointTransactions`,
//! `referrals`, `ranking`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use ym_core::models::audit::AdminAction;
use ym_core::models::business::PointsOperation;
use ym_core::store::{Feed, UserStore};

use super::{IdInput, MAX_LIMIT, Success, default_limit, feed};
use crate::AppState;
use crate::rpc::validate::{require_limit, require_non_empty, require_non_negative};
use crate::rpc::{AccessTier, Context, FieldIssue, Procedure, RpcError, RpcResult, Validate};
use crate::services::audit::{self, Target};
use crate::services::datastore::{or_default, written};

/// Phrase `appUsers.deleteAll` must be called with.
pub const DELETE_ALL_CONFIRMATION: &str = "EXCLUIR TODOS";

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        Procedure::query("appUsers.list", AccessTier::Admin, list),
        Procedure::query("appUsers.getById", AccessTier::Admin, get_by_id),
        Procedure::mutation("appUsers.updatePoints", AccessTier::Admin, update_points),
        Procedure::mutation("appUsers.updateBalance", AccessTier::Admin, update_balance),
        Procedure::mutation("appUsers.ban", AccessTier::Admin, ban),
        Procedure::mutation("appUsers.deleteAll", AccessTier::Admin, delete_all),
        Procedure::query("pointTransactions.list", AccessTier::Admin, point_transactions),
        feed("referrals.list", Feed::Referrals),
        feed("ranking.list", Feed::Ranking),
    ]
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListInput {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    search: Option<String>,
}

impl Validate for ListInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_limit(&mut issues, "limit", self.limit, MAX_LIMIT);
        require_non_negative(&mut issues, "offset", self.offset as f64);
        issues
    }
}

#[derive(Debug, Serialize)]
struct UserPage {
    users: Vec<Value>,
    total: i64,
}

async fn list(state: AppState, _ctx: Context, input: ListInput) -> RpcResult<UserPage> {
    let search = input
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let users = or_default(
        "appUsers.list",
        state.store.list_users(input.limit, input.offset, search).await,
    );
    let total = or_default("appUsers.list", state.store.count_users(search).await);
    Ok(UserPage { users, total })
}

async fn get_by_id(state: AppState, _ctx: Context, input: IdInput) -> RpcResult<Value> {
    or_default("appUsers.getById", state.store.get_user(input.id).await)
        .ok_or_else(|| RpcError::not_found("User not found"))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UpdatePointsInput {
    id: i32,
    points: i64,
    #[serde(default)]
    operation: PointsOperation,
}

impl Validate for UpdatePointsInput {}

async fn update_points(
    state: AppState,
    ctx: Context,
    input: UpdatePointsInput,
) -> RpcResult<Success> {
    let ok = written(
        "appUsers.updatePoints",
        state
            .store
            .update_points(input.id, input.operation, input.points)
            .await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::UpdatePoints,
            Some(Target::user(input.id)),
            audit::points_updated(input.id, input.operation, input.points),
        )
        .await;
    }
    Ok(Success::from(ok))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UpdateBalanceInput {
    id: i32,
    balance: f64,
}

impl Validate for UpdateBalanceInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_negative(&mut issues, "balance", self.balance);
        issues
    }
}

async fn update_balance(
    state: AppState,
    ctx: Context,
    input: UpdateBalanceInput,
) -> RpcResult<Success> {
    let ok = written(
        "appUsers.updateBalance",
        state.store.update_balance(input.id, input.balance).await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::UpdateBalance,
            Some(Target::user(input.id)),
            audit::balance_updated(input.id, input.balance),
        )
        .await;
    }
    Ok(Success::from(ok))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BanInput {
    id: i32,
    reason: String,
}

impl Validate for BanInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_empty(&mut issues, "reason", &self.reason);
        issues
    }
}

async fn ban(state: AppState, ctx: Context, input: BanInput) -> RpcResult<Success> {
    let outcome = state.store.ban_user(input.id, &input.reason).await;
    if let Ok(false) = outcome {
        info!(user_id = input.id, "banned user has no device on file");
    }
    let ok = written("appUsers.ban", outcome.map(|_| ()));
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::BanUser,
            Some(Target::user(input.id)),
            audit::user_banned(input.id, &input.reason),
        )
        .await;
    }
    Ok(Success::from(ok))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DeleteAllInput {
    confirm_text: String,
}

impl Validate for DeleteAllInput {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteAllResult {
    success: bool,
    deleted_count: u64,
}

async fn delete_all(
    state: AppState,
    ctx: Context,
    input: DeleteAllInput,
) -> RpcResult<DeleteAllResult> {
    if input.confirm_text != DELETE_ALL_CONFIRMATION {
        return Err(RpcError::bad_request("Incorrect confirmation text"));
    }
    match state.store.delete_all_users().await {
        Ok(deleted_count) => {
            audit::record(
                &state,
                &ctx,
                AdminAction::DeleteAllUsers,
                None,
                audit::users_deleted(deleted_count),
            )
            .await;
            Ok(DeleteAllResult {
                success: true,
                deleted_count,
            })
        }
        Err(e) => {
            error!("appUsers.deleteAll failed: {e}");
            Ok(DeleteAllResult {
                success: false,
                deleted_count: 0,
            })
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PointTransactionsInput {
    user_id: Option<i32>,
    #[serde(default = "default_limit")]
    limit: i64,
}

impl Validate for PointTransactionsInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_limit(&mut issues, "limit", self.limit, MAX_LIMIT);
        issues
    }
}

async fn point_transactions(
    state: AppState,
    _ctx: Context,
    input: PointTransactionsInput,
) -> RpcResult<Vec<Value>> {
    Ok(or_default(
        "pointTransactions.list",
        state
            .store
            .point_transactions(input.user_id, input.limit)
            .await,
    ))
}
