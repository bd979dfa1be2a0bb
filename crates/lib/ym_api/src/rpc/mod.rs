//! Typed RPC contract layer, wire-compatible with tRPC clients.
//!
//! Procedures are registered once into a [`ProcedureRouter`]; every call
//! goes through [`ProcedureRouter::dispatch`], which resolves the path,
//! checks the HTTP method against the procedure kind, enforces the access
//! tier and capability, then decodes the input and runs the handler.

pub mod context;
pub mod error;
pub mod procedure;
pub mod validate;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;
use ym_core::models::identity::{IdentityRecord, Role};

pub use context::{Context, ResponseCookies};
pub use error::{FieldIssue, RpcCode, RpcError, RpcResult};
pub use procedure::{AccessTier, Capability, Procedure, ProcedureKind};
pub use validate::Validate;

use crate::AppState;

/// Registry of every procedure, keyed by dotted path.
pub struct ProcedureRouter {
    procedures: BTreeMap<&'static str, Procedure>,
}

impl ProcedureRouter {
    pub fn new(procedures: impl IntoIterator<Item = Procedure>) -> Self {
        let procedures = procedures.into_iter().map(|p| (p.path, p)).collect();
        Self { procedures }
    }

    pub fn get(&self, path: &str) -> Option<&Procedure> {
        self.procedures.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Run one call arriving as `method` on `path`.
    pub async fn dispatch(
        &self,
        state: &AppState,
        ctx: Context,
        path: &str,
        method: ProcedureKind,
        raw: Value,
    ) -> RpcResult<Value> {
        let procedure = self.get(path).ok_or_else(|| {
            RpcError::not_found(format!(
                "No \"{}\"-procedure on path \"{path}\"",
                method.as_str()
            ))
        })?;
        if procedure.kind != method {
            return Err(RpcError::new(
                RpcCode::MethodNotSupported,
                format!(
                    "Unsupported {} for {} procedure",
                    match method {
                        ProcedureKind::Query => "GET",
                        ProcedureKind::Mutation => "POST",
                    },
                    procedure.kind.as_str()
                ),
            ));
        }
        authorize(
            procedure,
            ctx.caller.as_ref(),
            state.config.require_admin_auth,
        )?;
        if procedure.capability == Some(Capability::SqlConsole) && state.console.is_none() {
            return Err(RpcError::new(RpcCode::Forbidden, "SQL console is disabled"));
        }
        debug!(path, caller = ?ctx.caller_id(), "dispatching procedure");
        procedure.call(state.clone(), ctx, raw).await
    }
}

/// Tier actually enforced for a procedure.
///
/// With `require_admin_auth` off, admin procedures are public unless they
/// carry a capability; capability-gated procedures always need an admin.
pub fn effective_tier(procedure: &Procedure, require_admin_auth: bool) -> AccessTier {
    match procedure.tier {
        AccessTier::Admin if !require_admin_auth && procedure.capability.is_none() => {
            AccessTier::Public
        }
        tier => tier,
    }
}

/// Check the caller against the procedure's effective tier.
pub fn authorize(
    procedure: &Procedure,
    caller: Option<&IdentityRecord>,
    require_admin_auth: bool,
) -> RpcResult<()> {
    match effective_tier(procedure, require_admin_auth) {
        AccessTier::Public => Ok(()),
        AccessTier::Authenticated => caller.map(|_| ()).ok_or_else(RpcError::unauthorized),
        AccessTier::Admin => match caller {
            Some(identity) if identity.role == Role::Admin => Ok(()),
            _ => Err(RpcError::forbidden()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde::Deserialize;

    #[derive(Deserialize, schemars::JsonSchema)]
    struct Empty {}

    impl Validate for Empty {}

    async fn noop(_: AppState, _: Context, _: Empty) -> RpcResult<bool> {
        Ok(true)
    }

    fn identity(role: Role) -> IdentityRecord {
        let now = Utc::now();
        IdentityRecord {
            id: 1,
            open_id: "sub".into(),
            name: None,
            email: None,
            login_method: None,
            role,
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        }
    }

    #[test]
    fn admin_tier_requires_admin_role() {
        let p = Procedure::mutation("x.y", AccessTier::Admin, noop);
        assert_eq!(
            authorize(&p, Some(&identity(Role::User)), true),
            Err(RpcError::forbidden())
        );
        assert_eq!(
            authorize(&p, Some(&identity(Role::Superadmin)), true),
            Err(RpcError::forbidden())
        );
        assert_eq!(authorize(&p, None, true), Err(RpcError::forbidden()));
        assert!(authorize(&p, Some(&identity(Role::Admin)), true).is_ok());
    }

    #[test]
    fn toggle_opens_admin_tier_but_not_capabilities() {
        let plain = Procedure::mutation("x.y", AccessTier::Admin, noop);
        let console = Procedure::mutation("db.q", AccessTier::Admin, noop)
            .with_capability(Capability::SqlConsole);
        assert!(authorize(&plain, None, false).is_ok());
        assert_eq!(authorize(&console, None, false), Err(RpcError::forbidden()));
    }

    #[test]
    fn authenticated_tier_rejects_anonymous() {
        let p = Procedure::query("x.y", AccessTier::Authenticated, noop);
        assert_eq!(authorize(&p, None, true), Err(RpcError::unauthorized()));
        assert!(authorize(&p, Some(&identity(Role::User)), true).is_ok());
    }

    #[test]
    fn descriptor_includes_schema() {
        let p = Procedure::query("x.y", AccessTier::Public, noop);
        let d = p.describe();
        assert_eq!(d["kind"], "query");
        assert_eq!(d["tier"], "public");
        assert!(d["inputSchema"].is_object());
    }
}
