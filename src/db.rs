use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("cgpad.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            matric_no TEXT NOT NULL UNIQUE,
            registered_level INTEGER NOT NULL,
            current_level INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS levels(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            level INTEGER NOT NULL,
            cgpa REAL NOT NULL DEFAULT 0,
            FOREIGN KEY(user_id) REFERENCES profiles(id),
            UNIQUE(user_id, level)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_levels_user ON levels(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS semesters(
            id TEXT PRIMARY KEY,
            level_id TEXT NOT NULL,
            semester INTEGER NOT NULL,
            gpa REAL,
            total_units INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(level_id) REFERENCES levels(id),
            UNIQUE(level_id, semester)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_semesters_level ON semesters(level_id)",
        [],
    )?;

    // No UNIQUE on (semester_id, code): duplicate codes are allowed.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            semester_id TEXT NOT NULL,
            code TEXT NOT NULL,
            unit INTEGER NOT NULL,
            grade TEXT NOT NULL,
            point INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(semester_id) REFERENCES semesters(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_semester ON courses(semester_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_semester_created ON courses(semester_id, created_at)",
        [],
    )?;

    // Workspaces created before the profile carried a current level need the
    // column added and backfilled from registered_level.
    ensure_profiles_current_level(&conn)?;

    Ok(conn)
}

fn ensure_profiles_current_level(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "profiles", "current_level")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE profiles ADD COLUMN current_level INTEGER NOT NULL DEFAULT 100",
        [],
    )?;
    conn.execute(
        "UPDATE profiles SET current_level = registered_level",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
