//! `auth.*`: who is calling, and sign-out.

use tracing::debug;
use ym_core::models::identity::IdentityRecord;

use super::{NoInput, Success};
use crate::AppState;
use crate::rpc::{AccessTier, Context, Procedure, RpcResult};
use crate::services::cookies::clear_session_cookie;

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        Procedure::query("auth.me", AccessTier::Public, me),
        Procedure::mutation("auth.logout", AccessTier::Public, logout),
    ]
}

async fn me(_state: AppState, ctx: Context, _input: NoInput) -> RpcResult<Option<IdentityRecord>> {
    Ok(ctx.caller)
}

async fn logout(_state: AppState, ctx: Context, _input: NoInput) -> RpcResult<Success> {
    debug!(caller = ?ctx.caller_id(), "clearing session cookie");
    ctx.cookies.push(clear_session_cookie(ctx.secure));
    Ok(Success::from(true))
}
