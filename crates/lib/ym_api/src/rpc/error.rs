//! RPC error codes and their tRPC-compatible wire shape.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Message for procedures that need a signed-in caller.
pub const UNAUTHED_ERR_MSG: &str = "Please login (10001)";
/// Message for procedures that need the admin role.
pub const NOT_ADMIN_ERR_MSG: &str = "You do not have required permission (10002)";

/// Convenience alias for procedure return types.
pub type RpcResult<T> = Result<T, RpcError>;

/// Error codes surfaced to RPC clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    InternalServerError,
}

impl RpcCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcCode::BadRequest => "BAD_REQUEST",
            RpcCode::Unauthorized => "UNAUTHORIZED",
            RpcCode::Forbidden => "FORBIDDEN",
            RpcCode::NotFound => "NOT_FOUND",
            RpcCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            RpcCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// JSON-RPC 2.0 numeric code used by tRPC clients.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            RpcCode::BadRequest => -32600,
            RpcCode::Unauthorized => -32001,
            RpcCode::Forbidden => -32003,
            RpcCode::NotFound => -32004,
            RpcCode::MethodNotSupported => -32005,
            RpcCode::InternalServerError => -32603,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            RpcCode::BadRequest => StatusCode::BAD_REQUEST,
            RpcCode::Unauthorized => StatusCode::UNAUTHORIZED,
            RpcCode::Forbidden => StatusCode::FORBIDDEN,
            RpcCode::NotFound => StatusCode::NOT_FOUND,
            RpcCode::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            RpcCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One violated input rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Dotted path of the offending field; empty for the input as a whole.
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a procedure or by the dispatcher around it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code:?}: {message}")]
pub struct RpcError {
    pub code: RpcCode,
    pub message: String,
    pub issues: Vec<FieldIssue>,
}

impl RpcError {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            issues: Vec::new(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(RpcCode::Unauthorized, UNAUTHED_ERR_MSG)
    }

    pub fn forbidden() -> Self {
        Self::new(RpcCode::Forbidden, NOT_ADMIN_ERR_MSG)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcCode::BadRequest, message)
    }

    /// Input rejected before the handler ran.
    pub fn invalid_input(issues: Vec<FieldIssue>) -> Self {
        Self {
            code: RpcCode::BadRequest,
            message: "Invalid input".into(),
            issues,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcCode::InternalServerError, message)
    }

    /// Wire envelope: `{"error": {"message", "code", "data": {...}}}`.
    pub fn to_envelope(&self, path: &str) -> Value {
        let mut data = json!({
            "code": self.code.as_str(),
            "httpStatus": self.code.http_status().as_u16(),
            "path": path,
        });
        if !self.issues.is_empty() {
            data["issues"] = json!(self.issues);
        }
        json!({
            "error": {
                "message": self.message,
                "code": self.code.json_rpc_code(),
                "data": data,
            }
        })
    }
}
