use crate::db;
use crate::hierarchy::{FIRST_LEVEL_DIRECT_ENTRY, FIRST_LEVEL_STANDARD};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_store, str_param};
use crate::ipc::types::{AppState, Request, Session};
use crate::store::{NewProfile, RecordStore, SqliteStore};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match db::open_db(&path) {
        Ok(conn) => {
            state.workspace = Some(path.clone());
            state.store = Some(SqliteStore::new(conn));
            // A new workspace means any open session is stale.
            state.session = None;
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_profile_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let full_name = match str_param(&req.params, "fullName", &req.id) {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let matric_no = match str_param(&req.params, "matricNo", &req.id) {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if full_name.is_empty() || matric_no.is_empty() {
        return err(&req.id, "missing_field", "fill all fields", None);
    }

    let registered_level = match req.params.get("registeredLevel").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing registeredLevel", None),
    };
    if registered_level != FIRST_LEVEL_STANDARD && registered_level != FIRST_LEVEL_DIRECT_ENTRY {
        return err(
            &req.id,
            "bad_params",
            format!(
                "registeredLevel must be {} or {}",
                FIRST_LEVEL_STANDARD, FIRST_LEVEL_DIRECT_ENTRY
            ),
            None,
        );
    }

    match store.insert_profile(NewProfile {
        full_name,
        matric_no,
        registered_level,
    }) {
        Ok(profile) => ok(&req.id, json!({ "profile": profile })),
        Err(e) => err(
            &req.id,
            e.code(),
            e.message,
            Some(json!({ "table": "profiles" })),
        ),
    }
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let user_id = match str_param(&req.params, "userId", &req.id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let profile = match store.profile(&user_id) {
        Ok(Some(p)) => p,
        Ok(None) => return err(&req.id, "not_found", "profile not found", None),
        Err(e) => return err(&req.id, e.code(), e.message, None),
    };

    state.session = Some(Session {
        user_id: profile.id.clone(),
    });
    ok(&req.id, json!({ "profile": profile }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "profile.register" => Some(handle_profile_register(state, req)),
        "session.open" => Some(handle_session_open(state, req)),
        _ => None,
    }
}
