use serde_json::Value;

use super::error::err;
use super::types::Session;
use crate::store::SqliteStore;

// Shared request guards. Each returns the ready error envelope on failure
// so handler arms can bail with a single `return`.

pub fn require_store<'a>(
    store: &'a Option<SqliteStore>,
    req_id: &str,
) -> Result<&'a SqliteStore, Value> {
    store
        .as_ref()
        .ok_or_else(|| err(req_id, "no_workspace", "select a workspace first", None))
}

pub fn require_session<'a>(
    session: &'a Option<Session>,
    req_id: &str,
) -> Result<&'a Session, Value> {
    session
        .as_ref()
        .ok_or_else(|| err(req_id, "no_session", "open a session first", None))
}

pub fn str_param(params: &Value, key: &str, req_id: &str) -> Result<String, Value> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| err(req_id, "bad_params", format!("missing {}", key), None))
}
