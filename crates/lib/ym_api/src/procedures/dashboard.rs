//! `dashboard.stats`

use ym_core::models::business::DashboardStats;
use ym_core::store::UserStore;

use super::NoInput;
use crate::AppState;
use crate::rpc::{AccessTier, Context, Procedure, RpcResult};
use crate::services::datastore::or_default;

pub(super) fn procedures() -> Vec<Procedure> {
    vec![Procedure::query("dashboard.stats", AccessTier::Admin, stats)]
}

async fn stats(state: AppState, _ctx: Context, _input: NoInput) -> RpcResult<DashboardStats> {
    Ok(or_default("dashboard.stats", state.store.dashboard_stats().await))
}
