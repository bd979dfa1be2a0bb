//! The procedure tree served under `/api/trpc`.
//!
//! One module per dashboard area. Every procedure is admin tier unless it
//! says otherwise. Mutations perform one primary write through the store
//! and, only when it succeeded, append one admin log entry.

mod activity;
mod app_users;
mod auth;
mod dashboard;
mod database;
mod notifications;
mod security;
mod settings;
mod system;
mod withdrawals;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ym_core::store::{Feed, FeedStore};

use crate::AppState;
use crate::rpc::validate::require_limit;
use crate::rpc::{AccessTier, Context, FieldIssue, Procedure, RpcError, Validate};
use crate::services::datastore::or_default;

/// Page size used when a listing omits `limit`.
pub const DEFAULT_LIMIT: i64 = 100;
/// Largest accepted `limit`.
pub const MAX_LIMIT: i64 = 10_000;

pub(crate) fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Every registered procedure.
pub fn all() -> Vec<Procedure> {
    [
        system::procedures(),
        auth::procedures(),
        dashboard::procedures(),
        app_users::procedures(),
        withdrawals::procedures(),
        settings::procedures(),
        notifications::procedures(),
        security::procedures(),
        activity::procedures(),
        database::procedures(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Input of procedures that take nothing.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoInput {}

impl Validate for NoInput {}

/// `{limit}` input of the bounded listings.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LimitInput {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Validate for LimitInput {
    fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        require_limit(&mut issues, "limit", self.limit, MAX_LIMIT);
        issues
    }
}

/// `{id}` input.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IdInput {
    pub id: i32,
}

impl Validate for IdInput {}

/// `{success}` result of mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Success {
    pub success: bool,
}

impl From<bool> for Success {
    fn from(success: bool) -> Self {
        Self { success }
    }
}

/// A `{limit}` listing served straight from a feed.
pub(crate) fn feed(path: &'static str, feed: Feed) -> Procedure {
    Procedure::query(
        path,
        AccessTier::Admin,
        move |state: AppState, _ctx: Context, input: LimitInput| async move {
            Ok::<Vec<Value>, RpcError>(or_default(path, state.store.feed(feed, input.limit).await))
        },
    )
}
