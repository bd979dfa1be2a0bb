//! `system.*`: liveness, owner notifications and the procedure listing.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{NoInput, Success};
use crate::AppState;
use crate::rpc::validate::{require_non_empty, require_non_negative};
use crate::rpc::{AccessTier, Context, FieldIssue, Procedure, RpcResult, Validate};

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        Procedure::query("system.health", AccessTier::Public, health),
        Procedure::mutation("system.notifyOwner", AccessTier::Admin, notify_owner),
        Procedure::query("system.procedures", AccessTier::Admin, list_procedures),
    ]
}

#[derive(Debug, Deserialize, JsonSchema)]
struct HealthInput {
    timestamp: f64,
}

impl Validate for HealthInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_negative(&mut issues, "timestamp", self.timestamp);
        issues
    }
}

async fn health(_state: AppState, _ctx: Context, _input: HealthInput) -> RpcResult<Value> {
    Ok(json!({ "ok": true }))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NotifyOwnerInput {
    title: String,
    content: String,
}

impl Validate for NotifyOwnerInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_empty(&mut issues, "title", &self.title);
        require_non_empty(&mut issues, "content", &self.content);
        issues
    }
}

async fn notify_owner(
    state: AppState,
    _ctx: Context,
    input: NotifyOwnerInput,
) -> RpcResult<Success> {
    let delivered = state
        .notifier
        .notify_owner(&input.title, &input.content)
        .await?;
    Ok(Success::from(delivered))
}

async fn list_procedures(state: AppState, _ctx: Context, _input: NoInput) -> RpcResult<Vec<Value>> {
    Ok(state.procedures.iter().map(|p| p.describe()).collect())
}
