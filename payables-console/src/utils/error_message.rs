//! Reduce any collaborator failure to one display string.
//!
//! Upstream validation errors come in several shapes: a plain string, a
//! `detail` string, a single `{msg}` object or a list of per-field
//! `{loc, msg, type}` objects. All of them end up here.

use crate::services::{CollaboratorFailure, ResponseBody};
use serde_json::Value;

/// Shown when no response body exists (network failure, timeout, empty body).
pub const GENERIC_FAILURE_MESSAGE: &str = "Erro desconhecido";

/// Never fails; every input yields a message.
pub fn normalize_failure(failure: &CollaboratorFailure) -> String {
    match failure {
        CollaboratorFailure::Transport(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        CollaboratorFailure::Rejected { body: None, .. } => GENERIC_FAILURE_MESSAGE.to_string(),
        CollaboratorFailure::Rejected {
            body: Some(body), ..
        } => normalize_body(body),
        CollaboratorFailure::Decode(raw) if raw.trim().is_empty() => {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
        CollaboratorFailure::Decode(raw) => raw.clone(),
    }
}

fn normalize_body(body: &ResponseBody) -> String {
    match body {
        ResponseBody::Text(text) => text.clone(),
        ResponseBody::Json(Value::String(text)) => text.clone(),
        ResponseBody::Json(json) => match json.get("detail") {
            Some(detail) if !is_empty_detail(detail) => normalize_detail(detail),
            _ => json.to_string(),
        },
    }
}

/// Null, false, zero and blank strings carry no message.
fn is_empty_detail(detail: &Value) -> bool {
    match detail {
        Value::Null | Value::Bool(false) => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        _ => false,
    }
}

fn normalize_detail(detail: &Value) -> String {
    match detail {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| item_message(item).unwrap_or_else(|| item.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        other => item_message(other).unwrap_or_else(|| other.to_string()),
    }
}

fn item_message(item: &Value) -> Option<String> {
    ["msg", "message"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
