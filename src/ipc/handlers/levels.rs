use crate::hierarchy;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_session, require_store};
use crate::ipc::types::{AppState, Request};
use crate::store::{LevelRecord, RecordStore};
use crate::view;
use serde_json::json;

fn handle_levels_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let session = match require_session(&state.session, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.levels_for_user(&session.user_id) {
        Ok(levels) => ok(&req.id, json!({ "levels": levels })),
        Err(e) => err(&req.id, e.code(), e.message, None),
    }
}

fn handle_levels_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    if !state.add_level_guard.try_begin() {
        return err(
            &req.id,
            "in_flight",
            "an add-level operation is already in progress",
            None,
        );
    }

    let resp = (|| {
        let store = match require_store(&state.store, &req.id) {
            Ok(s) => s,
            Err(resp) => return resp,
        };
        let session = match require_session(&state.session, &req.id) {
            Ok(s) => s,
            Err(resp) => return resp,
        };
        let direct_entry = req
            .params
            .get("directEntry")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let mut levels = match store.levels_for_user(&session.user_id) {
            Ok(v) => v,
            Err(e) => return err(&req.id, e.code(), e.message, None),
        };

        match add_level(store, &session.user_id, direct_entry, &mut levels) {
            Ok(added) => {
                let current_level = added.level;
                ok(
                    &req.id,
                    json!({
                        "level": added,
                        "levels": levels,
                        "currentLevel": current_level,
                    }),
                )
            }
            Err((code, message)) => err(&req.id, &code, message, None),
        }
    })();

    state.add_level_guard.finish();
    resp
}

/// The optimistic add-level flow against the in-memory levels list:
/// gate, splice a placeholder, write, then swap it for the stored record
/// or filter it back out. On success the profile's current level follows.
fn add_level(
    store: &dyn RecordStore,
    user_id: &str,
    direct_entry: bool,
    levels: &mut Vec<LevelRecord>,
) -> Result<LevelRecord, (String, String)> {
    let next = hierarchy::next_level_number(levels, direct_entry)
        .map_err(|g| (g.code.to_string(), g.message))?;

    let temp_id = view::apply(
        levels,
        LevelRecord {
            id: view::placeholder_id(),
            user_id: user_id.to_string(),
            level: next,
            cgpa: 0.0,
        },
    );

    match store.insert_level(user_id, next) {
        Ok(record) => {
            view::confirm(levels, &temp_id, record.clone());
            store
                .set_current_level(user_id, next)
                .map_err(|e| (e.code().to_string(), e.message))?;
            Ok(record)
        }
        Err(e) => {
            view::rollback(levels, &temp_id);
            Err((e.code().to_string(), e.message))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "levels.list" => Some(handle_levels_list(state, req)),
        "levels.add" => Some(handle_levels_add(state, req)),
        _ => None,
    }
}
