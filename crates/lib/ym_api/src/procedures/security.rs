//! `blacklist.*`, `security.violations` and `sessions.*`.

use schemars::JsonSchema;
use serde::Deserialize;
use ym_core::models::audit::AdminAction;
use ym_core::store::{Feed, SecurityStore};

use super::{IdInput, Success, feed};
use crate::AppState;
use crate::rpc::validate::require_non_empty;
use crate::rpc::{AccessTier, Context, FieldIssue, Procedure, RpcResult, Validate};
use crate::services::audit::{self, Target};
use crate::services::datastore::written;

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        feed("blacklist.list", Feed::Blacklist),
        Procedure::mutation("blacklist.add", AccessTier::Admin, add_to_blacklist),
        Procedure::mutation("blacklist.remove", AccessTier::Admin, remove_from_blacklist),
        feed("security.violations", Feed::SecurityViolations),
        feed("sessions.list", Feed::ActiveSessions),
        Procedure::mutation("sessions.terminate", AccessTier::Admin, terminate_session),
    ]
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct BlacklistInput {
    device_id: String,
    reason: String,
}

impl Validate for BlacklistInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_empty(&mut issues, "deviceId", &self.device_id);
        require_non_empty(&mut issues, "reason", &self.reason);
        issues
    }
}

async fn add_to_blacklist(
    state: AppState,
    ctx: Context,
    input: BlacklistInput,
) -> RpcResult<Success> {
    let ok = written(
        "blacklist.add",
        state
            .store
            .add_to_blacklist(&input.device_id, &input.reason)
            .await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::AddBlacklist,
            None,
            format!("Device {} blacklisted: {}", input.device_id, input.reason),
        )
        .await;
    }
    Ok(Success::from(ok))
}

async fn remove_from_blacklist(state: AppState, ctx: Context, input: IdInput) -> RpcResult<Success> {
    let ok = written(
        "blacklist.remove",
        state.store.remove_from_blacklist(input.id).await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::RemoveBlacklist,
            Some(Target::blacklist(input.id)),
            format!("Blacklist entry {} removed", input.id),
        )
        .await;
    }
    Ok(Success::from(ok))
}

async fn terminate_session(state: AppState, ctx: Context, input: IdInput) -> RpcResult<Success> {
    let ok = written(
        "sessions.terminate",
        state.store.terminate_session(input.id).await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::TerminateSession,
            Some(Target::session(input.id)),
            format!("Session {} terminated", input.id),
        )
        .await;
    }
    Ok(Success::from(ok))
}
