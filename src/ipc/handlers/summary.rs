use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_session, require_store};
use crate::ipc::types::{AppState, Request};
use crate::store::RecordStore;
use serde_json::json;

/// Account-wide CGPA over every calculated semester. Display only; this
/// number is never written back to any level.
fn handle_dashboard_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let session = match require_session(&state.session, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let semesters = match store.semesters_for_user(&session.user_id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.code(), e.message, None),
    };

    let cgpa = calc::weighted_cgpa(semesters.iter().map(|s| calc::SemesterWeight {
        gpa: s.gpa,
        total_units: s.total_units,
    }));

    ok(
        &req.id,
        json!({ "cumulativeCgpa": calc::round_off_2_decimals(cgpa) }),
    )
}

fn handle_profile_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let session = match require_session(&state.session, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let profile = match store.profile(&session.user_id) {
        Ok(Some(p)) => p,
        Ok(None) => return err(&req.id, "not_found", "profile not found", None),
        Err(e) => return err(&req.id, e.code(), e.message, None),
    };

    // Nested fetch: levels → semesters → courses, reduced to unit/point
    // weights for the cumulative summary.
    let levels = match store.levels_for_user(&profile.id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.code(), e.message, None),
    };

    let mut account: Vec<Vec<Vec<calc::CourseWeight>>> = Vec::with_capacity(levels.len());
    for level in &levels {
        let semesters = match store.semesters_for_level(&level.id) {
            Ok(v) => v,
            Err(e) => return err(&req.id, e.code(), e.message, None),
        };
        let mut per_level = Vec::with_capacity(semesters.len());
        for semester in &semesters {
            let courses = match store.courses_for_semester(&semester.id) {
                Ok(v) => v,
                Err(e) => return err(&req.id, e.code(), e.message, None),
            };
            per_level.push(
                courses
                    .iter()
                    .map(|c| calc::CourseWeight {
                        point: c.point,
                        unit: c.unit,
                    })
                    .collect(),
            );
        }
        account.push(per_level);
    }

    let mut summary = calc::cumulative_summary(&account);
    summary.cgpa = calc::round_off_2_decimals(summary.cgpa);

    ok(&req.id, json!({ "profile": profile, "summary": summary }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.get" => Some(handle_dashboard_get(state, req)),
        "profile.get" => Some(handle_profile_get(state, req)),
        _ => None,
    }
}
