//! `withdrawals.*` and `pixPayments.list`.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use ym_core::models::audit::AdminAction;
use ym_core::models::business::{NewWithdrawal, WithdrawalStats, WithdrawalStatus};
use ym_core::store::{Feed, WithdrawalStore};

use super::{MAX_LIMIT, NoInput, Success, default_limit, feed};
use crate::AppState;
use crate::rpc::validate::{require_limit, require_non_empty};
use crate::rpc::{AccessTier, Context, FieldIssue, Procedure, RpcResult, Validate};
use crate::services::audit::{self, Target};
use crate::services::datastore::{or_default, written};

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        Procedure::query("withdrawals.list", AccessTier::Admin, list),
        Procedure::mutation("withdrawals.updateStatus", AccessTier::Admin, update_status),
        Procedure::query("withdrawals.stats", AccessTier::Admin, stats),
        Procedure::mutation("withdrawals.create", AccessTier::Admin, create),
        feed("withdrawals.requests", Feed::WithdrawalRequests),
        feed("pixPayments.list", Feed::PixPayments),
    ]
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListInput {
    status: Option<WithdrawalStatus>,
    #[serde(default = "default_limit")]
    limit: i64,
}

impl Validate for ListInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_limit(&mut issues, "limit", self.limit, MAX_LIMIT);
        issues
    }
}

async fn list(state: AppState, _ctx: Context, input: ListInput) -> RpcResult<Vec<Value>> {
    let status = input.status.map(|s| s.as_str());
    Ok(or_default(
        "withdrawals.list",
        state.store.list_withdrawals(status, input.limit).await,
    ))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusInput {
    id: i32,
    status: WithdrawalStatus,
    receipt_url: Option<String>,
}

impl Validate for UpdateStatusInput {}

async fn update_status(
    state: AppState,
    ctx: Context,
    input: UpdateStatusInput,
) -> RpcResult<Success> {
    let receipt_url = input.receipt_url.as_deref().filter(|u| !u.trim().is_empty());
    let ok = written(
        "withdrawals.updateStatus",
        state
            .store
            .update_withdrawal_status(input.id, input.status, receipt_url)
            .await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::UpdateWithdrawal,
            Some(Target::withdrawal(input.id)),
            audit::withdrawal_updated(input.id, input.status, receipt_url.is_some()),
        )
        .await;
    }
    Ok(Success::from(ok))
}

async fn stats(state: AppState, _ctx: Context, _input: NoInput) -> RpcResult<WithdrawalStats> {
    Ok(or_default(
        "withdrawals.stats",
        state.store.withdrawal_stats().await,
    ))
}

fn pending() -> WithdrawalStatus {
    WithdrawalStatus::Pending
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    user_id: i32,
    amount: f64,
    pix_type: String,
    pix_key: String,
    #[serde(default = "pending")]
    status: WithdrawalStatus,
}

impl Validate for CreateInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        if self.amount <= 0.0 {
            issues.push(FieldIssue::new("amount", "amount must be positive"));
        }
        require_non_empty(&mut issues, "pixType", &self.pix_type);
        require_non_empty(&mut issues, "pixKey", &self.pix_key);
        issues
    }
}

async fn create(state: AppState, ctx: Context, input: CreateInput) -> RpcResult<Success> {
    let withdrawal = NewWithdrawal {
        user_id: input.user_id,
        amount: input.amount,
        pix_type: input.pix_type,
        pix_key: input.pix_key,
        status: input.status.as_str().to_string(),
    };
    let ok = written(
        "withdrawals.create",
        state.store.create_withdrawal(&withdrawal).await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::CreateWithdrawal,
            Some(Target::user(withdrawal.user_id)),
            audit::withdrawal_created(withdrawal.user_id, withdrawal.amount),
        )
        .await;
    }
    Ok(Success::from(ok))
}
