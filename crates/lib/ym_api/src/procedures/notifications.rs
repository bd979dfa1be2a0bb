//! `notifications.*`: feed, single send and broadcast.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ym_core::models::audit::AdminAction;
use ym_core::models::business::NewNotification;
use ym_core::store::{Feed, NotificationStore, UserStore};

use super::{Success, feed};
use crate::AppState;
use crate::rpc::validate::{require_non_empty, require_non_negative};
use crate::rpc::{AccessTier, Context, FieldIssue, Procedure, RpcResult, Validate};
use crate::services::audit::{self, Target};
use crate::services::datastore::written;

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        feed("notifications.list", Feed::Notifications),
        Procedure::mutation("notifications.create", AccessTier::Admin, create),
        Procedure::mutation("notifications.broadcast", AccessTier::Admin, broadcast),
    ]
}

fn default_kind() -> String {
    "info".to_string()
}

fn check_message(title: &str, message: &str, points: i64) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    require_non_empty(&mut issues, "title", title);
    require_non_empty(&mut issues, "message", message);
    require_non_negative(&mut issues, "points", points as f64);
    issues
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    user_id: i32,
    title: String,
    message: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    points: i64,
}

impl Validate for CreateInput {
    fn validate(&self) -> Vec<FieldIssue> {
        check_message(&self.title, &self.message, self.points)
    }
}

async fn create(state: AppState, ctx: Context, input: CreateInput) -> RpcResult<Success> {
    let notification = NewNotification {
        user_id: input.user_id,
        title: input.title,
        message: input.message,
        kind: input.kind,
        points: input.points,
    };
    let ok = written(
        "notifications.create",
        state.store.create_notification(&notification).await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::CreateNotification,
            Some(Target::user(notification.user_id)),
            audit::notification_sent(notification.user_id, notification.points),
        )
        .await;
    }
    Ok(Success::from(ok))
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BroadcastInput {
    title: String,
    message: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    points: i64,
}

impl Validate for BroadcastInput {
    fn validate(&self) -> Vec<FieldIssue> {
        check_message(&self.title, &self.message, self.points)
    }
}

#[derive(Debug, Default, Serialize)]
struct BroadcastResult {
    success: bool,
    delivered: usize,
    failed: usize,
    total: usize,
}

/// Sends to every user, one transaction per recipient. A failed recipient is
/// logged and skipped.
async fn broadcast(state: AppState, ctx: Context, input: BroadcastInput) -> RpcResult<BroadcastResult> {
    let user_ids = match state.store.list_user_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            warn!("notifications.broadcast could not list recipients: {e}");
            return Ok(BroadcastResult::default());
        }
    };

    let mut result = BroadcastResult {
        success: true,
        total: user_ids.len(),
        ..Default::default()
    };
    for user_id in user_ids {
        let notification = NewNotification {
            user_id,
            title: input.title.clone(),
            message: input.message.clone(),
            kind: input.kind.clone(),
            points: input.points,
        };
        match state.store.create_notification(&notification).await {
            Ok(()) => result.delivered += 1,
            Err(e) => {
                warn!(user_id, "broadcast delivery failed: {e}");
                result.failed += 1;
            }
        }
    }
    info!(
        delivered = result.delivered,
        failed = result.failed,
        "broadcast finished"
    );

    audit::record(
        &state,
        &ctx,
        AdminAction::BroadcastNotification,
        None,
        audit::broadcast_sent(&input.title, input.points, result.delivered, result.total),
    )
    .await;
    Ok(result)
}
