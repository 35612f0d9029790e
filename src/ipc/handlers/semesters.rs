use crate::hierarchy;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_session, require_store, str_param};
use crate::ipc::types::{AppState, Request};
use crate::store::{RecordStore, SemesterRecord, SqliteStore};
use crate::view;
use serde_json::json;

/// Levels are user-scoped; a level id from another account reads as absent.
fn owned_level(
    store: &SqliteStore,
    user_id: &str,
    level_id: &str,
) -> Result<crate::store::LevelRecord, (String, String)> {
    match store.level(level_id) {
        Ok(Some(level)) if level.user_id == user_id => Ok(level),
        Ok(_) => Err(("not_found".into(), "level not found".into())),
        Err(e) => Err((e.code().to_string(), e.message)),
    }
}

fn handle_semesters_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let session = match require_session(&state.session, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let level_id = match str_param(&req.params, "levelId", &req.id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let level = match owned_level(store, &session.user_id, &level_id) {
        Ok(l) => l,
        Err((code, message)) => return err(&req.id, &code, message, None),
    };

    match store.semesters_for_level(&level.id) {
        Ok(semesters) => ok(
            &req.id,
            json!({ "level": level, "semesters": semesters }),
        ),
        Err(e) => err(&req.id, e.code(), e.message, None),
    }
}

fn handle_semesters_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    if !state.add_semester_guard.try_begin() {
        return err(
            &req.id,
            "in_flight",
            "an add-semester operation is already in progress",
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
        let level_id = match str_param(&req.params, "levelId", &req.id) {
            Ok(v) => v,
            Err(resp) => return resp,
        };

        let level = match owned_level(store, &session.user_id, &level_id) {
            Ok(l) => l,
            Err((code, message)) => return err(&req.id, &code, message, None),
        };
        let mut semesters = match store.semesters_for_level(&level.id) {
            Ok(v) => v,
            Err(e) => return err(&req.id, e.code(), e.message, None),
        };

        match add_semester(store, &level.id, &mut semesters) {
            Ok(added) => ok(
                &req.id,
                json!({ "semester": added, "semesters": semesters }),
            ),
            Err((code, message)) => err(&req.id, &code, message, None),
        }
    })();

    state.add_semester_guard.finish();
    resp
}

/// Optimistic add-semester: gate on the cap and the previous semester's
/// status, splice a placeholder, write, reconcile.
fn add_semester(
    store: &dyn RecordStore,
    level_id: &str,
    semesters: &mut Vec<SemesterRecord>,
) -> Result<SemesterRecord, (String, String)> {
    let ordinal = hierarchy::next_semester_ordinal(semesters)
        .map_err(|g| (g.code.to_string(), g.message))?;

    let temp_id = view::apply(
        semesters,
        SemesterRecord {
            id: view::placeholder_id(),
            level_id: level_id.to_string(),
            semester: ordinal,
            gpa: None,
            total_units: 0,
        },
    );

    match store.insert_semester(level_id, ordinal) {
        Ok(record) => {
            view::confirm(semesters, &temp_id, record.clone());
            Ok(record)
        }
        Err(e) => {
            view::rollback(semesters, &temp_id);
            Err((e.code().to_string(), e.message))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "semesters.list" => Some(handle_semesters_list(state, req)),
        "semesters.add" => Some(handle_semesters_add(state, req)),
        _ => None,
    }
}
