//! `/api/trpc/{path}`: HTTP binding of the procedure router.
//!
//! Queries arrive as `GET ?input=<json>`, mutations as `POST` with a JSON
//! body. `?batch=1` carries several comma-separated paths with inputs keyed
//! by position (`{"0": .., "1": ..}`); the response is an array in the same
//! order.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, Path, Query, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::AppState;
use crate::middleware::auth::Caller;
use crate::rpc::context::client_ip;
use crate::rpc::{Context, ProcedureKind, RpcCode, RpcError, RpcResult};
use crate::services::cookies::is_secure_request;

/// Largest accepted request body.
const BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Query-string parameters of an RPC call.
#[derive(Debug, Default, Deserialize)]
pub struct TrpcParams {
    pub batch: Option<String>,
    pub input: Option<String>,
}

/// `GET|POST /api/trpc/{path}`
pub async fn trpc_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<TrpcParams>,
    request: Request,
) -> Response {
    let kind = if request.method() == Method::GET {
        ProcedureKind::Query
    } else {
        ProcedureKind::Mutation
    };
    let ctx = request_context(&request);
    let batch = matches!(params.batch.as_deref(), Some("1" | "true"));
    let paths: Vec<&str> = if batch {
        path.split(',').collect()
    } else {
        vec![path.as_str()]
    };

    let raw = match read_input(kind, params.input.as_deref(), request).await {
        Ok(raw) => raw,
        Err(e) => {
            let results = paths.iter().map(|p| (*p, Err(e.clone()))).collect();
            return encode(results, batch);
        }
    };

    let mut results = Vec::with_capacity(paths.len());
    for (index, procedure_path) in paths.iter().enumerate() {
        let input = if batch {
            raw.get(index.to_string().as_str())
                .cloned()
                .unwrap_or(Value::Null)
        } else {
            raw.clone()
        };
        let outcome = state
            .procedures
            .dispatch(&state, ctx.clone(), procedure_path, kind, input)
            .await;
        results.push((*procedure_path, outcome));
    }

    let mut response = encode(results, batch);
    for cookie in ctx.cookies.take() {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("dropping unencodable cookie: {e}"),
        }
    }
    response
}

fn request_context(request: &Request) -> Context {
    let caller = request
        .extensions()
        .get::<Caller>()
        .and_then(|c| c.0.clone());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    Context {
        caller,
        client_ip: client_ip(request.headers(), peer),
        secure: is_secure_request(request.headers(), request.uri()),
        cookies: Default::default(),
    }
}

async fn read_input(
    kind: ProcedureKind,
    query_input: Option<&str>,
    request: Request,
) -> RpcResult<Value> {
    match kind {
        ProcedureKind::Query => match query_input {
            None | Some("") => Ok(Value::Null),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| RpcError::bad_request(format!("Invalid input JSON: {e}"))),
        },
        ProcedureKind::Mutation => {
            let body = axum::body::to_bytes(request.into_body(), BODY_LIMIT)
                .await
                .map_err(|e| RpcError::bad_request(format!("Failed to read body: {e}")))?;
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&body)
                .map_err(|e| RpcError::bad_request(format!("Invalid JSON body: {e}")))
        }
    }
}

fn envelope(path: &str, outcome: RpcResult<Value>) -> (StatusCode, Value) {
    match outcome {
        Ok(data) => (StatusCode::OK, json!({ "result": { "data": data } })),
        Err(e) => {
            if e.code == RpcCode::InternalServerError {
                error!(path, "procedure failed: {}", e.message);
            } else {
                debug!(path, code = e.code.as_str(), "procedure rejected: {}", e.message);
            }
            (e.code.http_status(), e.to_envelope(path))
        }
    }
}

fn encode(results: Vec<(&str, RpcResult<Value>)>, batch: bool) -> Response {
    let mut envelopes: Vec<(StatusCode, Value)> = results
        .into_iter()
        .map(|(path, outcome)| envelope(path, outcome))
        .collect();

    if !batch {
        let (status, body) = envelopes
            .pop()
            .unwrap_or_else(|| (StatusCode::NOT_FOUND, json!(null)));
        return (status, Json(body)).into_response();
    }

    let first = envelopes.first().map(|(s, _)| *s).unwrap_or(StatusCode::OK);
    let status = if envelopes.iter().all(|(s, _)| *s == first) {
        first
    } else {
        StatusCode::MULTI_STATUS
    };
    let bodies: Vec<Value> = envelopes.into_iter().map(|(_, body)| body).collect();
    (status, Json(Value::Array(bodies))).into_response()
}
