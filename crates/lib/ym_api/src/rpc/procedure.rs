//! Procedure descriptors: path, kind, access tier, input schema, handler.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::context::Context;
use super::error::{RpcError, RpcResult};
use super::validate::{Validate, decode_input};
use crate::AppState;

/// Whether a procedure reads (`GET`) or writes (`POST`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::Query => "query",
            ProcedureKind::Mutation => "mutation",
        }
    }
}

/// Minimum privilege a caller needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Public,
    Authenticated,
    Admin,
}

impl AccessTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::Public => "public",
            AccessTier::Authenticated => "authenticated",
            AccessTier::Admin => "admin",
        }
    }
}

/// Optional feature a procedure depends on, switched on by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SqlConsole,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::SqlConsole => "sqlConsole",
        }
    }
}

type Handler =
    Arc<dyn Fn(AppState, Context, Value) -> BoxFuture<'static, RpcResult<Value>> + Send + Sync>;

/// One named RPC operation. Built once at startup.
#[derive(Clone)]
pub struct Procedure {
    pub path: &'static str,
    pub kind: ProcedureKind,
    pub tier: AccessTier,
    pub capability: Option<Capability>,
    pub input_schema: Value,
    handler: Handler,
}

impl Procedure {
    /// A read-only procedure.
    pub fn query<I, O, F, Fut>(path: &'static str, tier: AccessTier, handler: F) -> Self
    where
        I: DeserializeOwned + JsonSchema + Validate + Send + 'static,
        O: Serialize + 'static,
        F: Fn(AppState, Context, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<O>> + Send + 'static,
    {
        Self::build(path, ProcedureKind::Query, tier, handler)
    }

    /// A procedure performing writes.
    pub fn mutation<I, O, F, Fut>(path: &'static str, tier: AccessTier, handler: F) -> Self
    where
        I: DeserializeOwned + JsonSchema + Validate + Send + 'static,
        O: Serialize + 'static,
        F: Fn(AppState, Context, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<O>> + Send + 'static,
    {
        Self::build(path, ProcedureKind::Mutation, tier, handler)
    }

    /// Gate the procedure behind a configurable capability.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    fn build<I, O, F, Fut>(
        path: &'static str,
        kind: ProcedureKind,
        tier: AccessTier,
        handler: F,
    ) -> Self
    where
        I: DeserializeOwned + JsonSchema + Validate + Send + 'static,
        O: Serialize + 'static,
        F: Fn(AppState, Context, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<O>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: Handler = Arc::new(move |state, ctx, raw| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let input = decode_input::<I>(raw)?;
                let output = handler(state, ctx, input).await?;
                serde_json::to_value(output)
                    .map_err(|e| RpcError::internal(format!("failed to encode output: {e}")))
            })
        });
        Self {
            path,
            kind,
            tier,
            capability: None,
            input_schema: serde_json::to_value(schemars::schema_for!(I)).unwrap_or(Value::Null),
            handler: erased,
        }
    }

    /// Decode the raw input and run the handler. Authorization is the
    /// caller's job.
    pub async fn call(&self, state: AppState, ctx: Context, raw: Value) -> RpcResult<Value> {
        (self.handler)(state, ctx, raw).await
    }

    /// Public description used by `system.procedures`.
    pub fn describe(&self) -> Value {
        json!({
            "path": self.path,
            "kind": self.kind.as_str(),
            "tier": self.tier.as_str(),
            "capability": self.capability.map(|c| c.as_str()),
            "inputSchema": self.input_schema,
        })
    }
}
