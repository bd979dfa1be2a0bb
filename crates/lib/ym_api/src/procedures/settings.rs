//! Configuration tables: `settings.*`, `roulette.*`, `tasks.*` and the
//! `checkin.list` feed.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use ym_core::models::audit::AdminAction;
use ym_core::models::business::{PrizeUpdate, TaskUpdate};
use ym_core::store::{Catalog, Feed, FeedStore, SettingsStore};

use super::{NoInput, Success, feed};
use crate::AppState;
use crate::rpc::validate::{require_non_empty, require_non_negative};
use crate::rpc::{AccessTier, Context, FieldIssue, Procedure, RpcError, RpcResult, Validate};
use crate::services::audit::{self, Target};
use crate::services::datastore::{or_default, written};

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        catalog("settings.list", Catalog::SystemSettings),
        Procedure::mutation("settings.update", AccessTier::Admin, update_setting),
        catalog("roulette.settings", Catalog::RouletteSettings),
        Procedure::mutation(
            "roulette.updateSetting",
            AccessTier::Admin,
            update_roulette_setting,
        ),
        catalog("roulette.prizes", Catalog::RoulettePrizes),
        Procedure::mutation("roulette.updatePrize", AccessTier::Admin, update_prize),
        feed("roulette.spinHistory", Feed::Spins),
        feed("checkin.list", Feed::Checkins),
        catalog("tasks.list", Catalog::DailyTasks),
        Procedure::mutation("tasks.update", AccessTier::Admin, update_task),
    ]
}

fn catalog(path: &'static str, catalog: Catalog) -> Procedure {
    Procedure::query(
        path,
        AccessTier::Admin,
        move |state: AppState, _ctx: Context, _input: NoInput| async move {
            Ok::<Vec<Value>, RpcError>(or_default(path, state.store.catalog(catalog).await))
        },
    )
}

#[derive(Debug, Deserialize, JsonSchema)]
struct KeyValueInput {
    key: String,
    value: String,
}

impl Validate for KeyValueInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_empty(&mut issues, "key", &self.key);
        issues
    }
}

async fn update_setting(state: AppState, ctx: Context, input: KeyValueInput) -> RpcResult<Success> {
    let ok = written(
        "settings.update",
        state
            .store
            .update_system_setting(&input.key, &input.value)
            .await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::UpdateSetting,
            None,
            audit::setting_updated(&input.key, &input.value),
        )
        .await;
    }
    Ok(Success::from(ok))
}

async fn update_roulette_setting(
    state: AppState,
    ctx: Context,
    input: KeyValueInput,
) -> RpcResult<Success> {
    let ok = written(
        "roulette.updateSetting",
        state
            .store
            .update_roulette_setting(&input.key, &input.value)
            .await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::UpdateRoulette,
            None,
            audit::roulette_setting_updated(&input.key, &input.value),
        )
        .await;
    }
    Ok(Success::from(ok))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdatePrizeInput {
    id: i32,
    prize_name: String,
    prize_value: f64,
    probability: f64,
    is_active: bool,
}

impl Validate for UpdatePrizeInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_non_empty(&mut issues, "prizeName", &self.prize_name);
        require_non_negative(&mut issues, "prizeValue", self.prize_value);
        if !(0.0..=100.0).contains(&self.probability) {
            issues.push(FieldIssue::new(
                "probability",
                "probability must be between 0 and 100",
            ));
        }
        issues
    }
}

async fn update_prize(state: AppState, ctx: Context, input: UpdatePrizeInput) -> RpcResult<Success> {
    let prize = PrizeUpdate {
        id: input.id,
        prize_name: input.prize_name,
        prize_value: input.prize_value,
        probability: input.probability,
        is_active: input.is_active,
    };
    let ok = written(
        "roulette.updatePrize",
        state.store.update_roulette_prize(&prize).await,
    );
    if ok {
        audit::record(
            &state,
            &ctx,
            AdminAction::UpdatePrize,
            Some(Target::prize(prize.id)),
            format!("Prize {} updated: {}", prize.id, prize.prize_name),
        )
        .await;
    }
    Ok(Success::from(ok))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskInput {
    id: i32,
    task_name: Option<String>,
    points_reward: Option<i64>,
    is_active: Option<bool>,
}

impl Validate for UpdateTaskInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        if let Some(name) = &self.task_name {
            require_non_empty(&mut issues, "taskName", name);
        }
        if let Some(points) = self.points_reward {
            require_non_negative(&mut issues, "pointsReward", points as f64);
        }
        issues
    }
}

/// Applies only the supplied fields. Nothing supplied means no write and no
/// log entry.
async fn update_task(state: AppState, ctx: Context, input: UpdateTaskInput) -> RpcResult<Success> {
    let task = TaskUpdate {
        id: input.id,
        task_name: input.task_name,
        points_reward: input.points_reward,
        is_active: input.is_active,
    };
    match state.store.update_daily_task(&task).await {
        Ok(true) => {
            audit::record(
                &state,
                &ctx,
                AdminAction::UpdateTask,
                Some(Target::task(task.id)),
                format!("Task {} updated", task.id),
            )
            .await;
            Ok(Success::from(true))
        }
        Ok(false) => Ok(Success::from(true)),
        Err(e) => Ok(Success::from(written("tasks.update", Err(e)))),
    }
}
