//! Input decoding and field-level validation.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::{FieldIssue, RpcError, RpcResult};

/// Field rules checked after an input has been decoded.
pub trait Validate {
    fn validate(&self) -> Vec<FieldIssue> {
        Vec::new()
    }
}

/// Push an issue when a string is blank after trimming.
pub fn require_non_empty(issues: &mut Vec<FieldIssue>, path: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(FieldIssue::new(path, format!("{path} is required")));
    }
}

/// Push an issue when a number is negative.
pub fn require_non_negative(issues: &mut Vec<FieldIssue>, path: &str, value: f64) {
    if value < 0.0 {
        issues.push(FieldIssue::new(path, format!("{path} cannot be negative")));
    }
}

/// Push an issue when a limit is outside `1..=max`.
pub fn require_limit(issues: &mut Vec<FieldIssue>, path: &str, value: i64, max: i64) {
    if !(1..=max).contains(&value) {
        issues.push(FieldIssue::new(
            path,
            format!("{path} must be between 1 and {max}"),
        ));
    }
}

/// Strip a `{"json": ...}` transformer envelope.
pub fn unwrap_envelope(raw: Value) -> Value {
    match raw {
        Value::Object(mut map)
            if map.contains_key("json") && map.keys().all(|k| k == "json" || k == "meta") =>
        {
            map.remove("json").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decode and validate a procedure input.
///
/// A missing input is decoded as `{}` so inputs whose fields all have
/// defaults accept it.
pub fn decode_input<I>(raw: Value) -> RpcResult<I>
where
    I: DeserializeOwned + Validate,
{
    let raw = match unwrap_envelope(raw) {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let input: I = serde_json::from_value(raw)
        .map_err(|e| RpcError::invalid_input(vec![issue_from_serde(&e)]))?;
    let issues = input.validate();
    if !issues.is_empty() {
        return Err(RpcError::invalid_input(issues));
    }
    Ok(input)
}

/// Turn a serde decoding error into a field issue, recovering the field
/// name where serde reports one.
fn issue_from_serde(err: &serde_json::Error) -> FieldIssue {
    let message = err.to_string();
    let path = ["missing field `", "unknown field `"]
        .iter()
        .find_map(|prefix| {
            let rest = message.strip_prefix(prefix)?;
            rest.split('`').next().map(str::to_string)
        })
        .unwrap_or_default();
    FieldIssue::new(path, message)
}
