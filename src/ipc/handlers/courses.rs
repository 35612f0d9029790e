use crate::calc;
use crate::grades::{self, Grade};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_session, require_store, str_param};
use crate::ipc::types::{AppState, Request};
use crate::store::{NewCourse, RecordStore, SemesterRecord, SqliteStore};
use serde_json::json;

/// Walks semester → level → user to confirm the semester belongs to the
/// session's account. Foreign semesters read as absent.
fn owned_semester(
    store: &SqliteStore,
    user_id: &str,
    semester_id: &str,
) -> Result<SemesterRecord, (String, String)> {
    let semester = match store.semester(semester_id) {
        Ok(Some(s)) => s,
        Ok(None) => return Err(("not_found".into(), "semester not found".into())),
        Err(e) => return Err((e.code().to_string(), e.message)),
    };
    match store.level(&semester.level_id) {
        Ok(Some(level)) if level.user_id == user_id => Ok(semester),
        Ok(_) => Err(("not_found".into(), "semester not found".into())),
        Err(e) => Err((e.code().to_string(), e.message)),
    }
}

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let session = match require_session(&state.session, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let semester_id = match str_param(&req.params, "semesterId", &req.id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let semester = match owned_semester(store, &session.user_id, &semester_id) {
        Ok(s) => s,
        Err((code, message)) => return err(&req.id, &code, message, None),
    };

    match store.courses_for_semester(&semester.id) {
        Ok(courses) => ok(
            &req.id,
            json!({ "semester": semester, "courses": courses }),
        ),
        Err(e) => err(&req.id, e.code(), e.message, None),
    }
}

fn handle_courses_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let session = match require_session(&state.session, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let semester_id = match str_param(&req.params, "semesterId", &req.id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let code_raw = req.params.get("code").and_then(|v| v.as_str());
    let unit_raw = req.params.get("unit").and_then(|v| v.as_i64());
    let grade_raw = req.params.get("grade").and_then(|v| v.as_str());
    let (Some(code_raw), Some(unit_raw), Some(grade_raw)) = (code_raw, unit_raw, grade_raw) else {
        return err(&req.id, "missing_field", "fill all fields", None);
    };

    let Some(code) = grades::normalize_course_code(code_raw) else {
        return err(&req.id, "invalid_course_code", "invalid course code", None);
    };
    let Some(unit) = grades::validate_unit(unit_raw) else {
        return err(&req.id, "invalid_unit", "unit must be a positive integer", None);
    };
    let Some(grade) = Grade::parse(grade_raw) else {
        return err(&req.id, "invalid_grade", "grade must be one of A-F", None);
    };

    let semester = match owned_semester(store, &session.user_id, &semester_id) {
        Ok(s) => s,
        Err((ecode, message)) => return err(&req.id, &ecode, message, None),
    };

    // The grade point is fixed at creation time and never recomputed.
    match store.insert_course(NewCourse {
        semester_id: semester.id,
        code,
        unit,
        grade: grade.as_str().to_string(),
        point: grade.point(),
    }) {
        Ok(course) => ok(&req.id, json!({ "course": course })),
        Err(e) => err(
            &req.id,
            e.code(),
            e.message,
            Some(json!({ "table": "courses" })),
        ),
    }
}

fn handle_courses_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    if let Err(resp) = require_session(&state.session, &req.id) {
        return resp;
    }
    let course_id = match str_param(&req.params, "courseId", &req.id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // Cached GPA totals are left alone; they refresh on the next
    // explicit gpa.calculate.
    match store.delete_course(&course_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": course_id })),
        Err(e) => err(&req.id, e.code(), e.message, None),
    }
}

fn handle_gpa_calculate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(&state.store, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let session = match require_session(&state.session, &req.id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let semester_id = match str_param(&req.params, "semesterId", &req.id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let semester = match owned_semester(store, &session.user_id, &semester_id) {
        Ok(s) => s,
        Err((code, message)) => return err(&req.id, &code, message, None),
    };

    let courses = match store.courses_for_semester(&semester.id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.code(), e.message, None),
    };

    let result = match calc::semester_gpa(courses.iter().map(|c| calc::CourseWeight {
        point: c.point,
        unit: c.unit,
    })) {
        Ok(r) => r,
        Err(e) => return err(&req.id, &e.code, e.message, None),
    };

    if let Err(e) = store.set_semester_result(&semester.id, result.gpa, result.total_units) {
        return err(&req.id, e.code(), e.message, None);
    }

    // Recompute the owning level's CGPA over all of its semesters,
    // including the totals just written.
    let semesters = match store.semesters_for_level(&semester.level_id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.code(), e.message, None),
    };
    let cgpa = calc::weighted_cgpa(semesters.iter().map(|s| calc::SemesterWeight {
        gpa: s.gpa,
        total_units: s.total_units,
    }));
    if let Err(e) = store.set_level_cgpa(&semester.level_id, cgpa) {
        return err(&req.id, e.code(), e.message, None);
    }

    ok(
        &req.id,
        json!({
            "semesterId": semester.id,
            "gpa": calc::round_off_2_decimals(result.gpa),
            "totalUnits": result.total_units,
            "levelId": semester.level_id,
            "cgpa": calc::round_off_2_decimals(cgpa),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.add" => Some(handle_courses_add(state, req)),
        "courses.delete" => Some(handle_courses_delete(state, req)),
        "gpa.calculate" => Some(handle_gpa_calculate(state, req)),
        _ => None,
    }
}
