use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_cgpad");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn cgpad");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value["error"]["code"]
        .as_str()
        .expect("error code")
        .to_string()
}

fn open_account(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
    registered_level: i64,
) -> String {
    request_ok(
        stdin,
        reader,
        "w",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let reg = request_ok(
        stdin,
        reader,
        "r",
        "profile.register",
        json!({
            "fullName": "Ada Obi",
            "matricNo": format!("U21/{registered_level}/001"),
            "registeredLevel": registered_level,
        }),
    );
    let user_id = reg["profile"]["id"].as_str().expect("user id").to_string();
    request_ok(
        stdin,
        reader,
        "s",
        "session.open",
        json!({ "userId": user_id }),
    );
    user_id
}

#[test]
fn first_level_is_100_for_standard_entry() {
    let workspace = temp_dir("cgpad-level-standard");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_account(&mut stdin, &mut reader, &workspace, 100);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "levels.add",
        json!({ "directEntry": false }),
    );
    assert_eq!(res["level"]["level"].as_i64(), Some(100));
    assert_eq!(res["currentLevel"].as_i64(), Some(100));
    assert_eq!(res["levels"].as_array().map(|a| a.len()), Some(1));

    let _ = child.kill();
}

#[test]
fn first_level_is_200_for_direct_entry() {
    let workspace = temp_dir("cgpad-level-direct");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_account(&mut stdin, &mut reader, &workspace, 200);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "levels.add",
        json!({ "directEntry": true }),
    );
    assert_eq!(res["level"]["level"].as_i64(), Some(200));

    let list = request_ok(&mut stdin, &mut reader, "2", "levels.list", json!({}));
    let levels = list["levels"].as_array().expect("levels");
    assert_eq!(levels.len(), 1);
    assert_eq!(levels[0]["level"].as_i64(), Some(200));
    // Server-assigned id, not a client placeholder.
    assert!(!levels[0]["id"].as_str().expect("id").starts_with("temp-"));

    let _ = child.kill();
}

#[test]
fn open_level_blocks_a_second_one() {
    let workspace = temp_dir("cgpad-level-gate");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_account(&mut stdin, &mut reader, &workspace, 100);

    request_ok(&mut stdin, &mut reader, "1", "levels.add", json!({}));
    let code = request_err_code(&mut stdin, &mut reader, "2", "levels.add", json!({}));
    assert_eq!(code, "level_open");

    // Still exactly one level: the refused attempt left nothing behind.
    let list = request_ok(&mut stdin, &mut reader, "3", "levels.list", json!({}));
    assert_eq!(list["levels"].as_array().map(|a| a.len()), Some(1));

    let _ = child.kill();
}

#[test]
fn closed_level_unlocks_the_next_at_plus_100() {
    let workspace = temp_dir("cgpad-level-sequence");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_account(&mut stdin, &mut reader, &workspace, 100);

    let added = request_ok(&mut stdin, &mut reader, "1", "levels.add", json!({}));
    let level_id = added["level"]["id"].as_str().expect("level id").to_string();

    let sem = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "semesters.add",
        json!({ "levelId": level_id }),
    );
    let semester_id = sem["semester"]["id"].as_str().expect("semester id").to_string();

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "courses.add",
        json!({ "semesterId": semester_id, "code": "MTH 101", "unit": 3, "grade": "B" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "gpa.calculate",
        json!({ "semesterId": semester_id }),
    );

    // CGPA recorded, so the level is closed and the next one opens at 200.
    let next = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "levels.add",
        json!({ "directEntry": true }),
    );
    assert_eq!(
        next["level"]["level"].as_i64(),
        Some(200),
        "directEntry is a first-level-only branch; growth is always +100"
    );
    assert_eq!(next["currentLevel"].as_i64(), Some(200));

    let _ = child.kill();
}

#[test]
fn record_methods_require_a_session() {
    let workspace = temp_dir("cgpad-level-nosession");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "w",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let code = request_err_code(&mut stdin, &mut reader, "1", "levels.list", json!({}));
    assert_eq!(code, "no_session");
    let code = request_err_code(&mut stdin, &mut reader, "2", "levels.add", json!({}));
    assert_eq!(code, "no_session");

    let _ = child.kill();
}
