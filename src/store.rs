use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

/// Failure taxonomy of the data-service contract. Reads fail as `Query`,
/// writes as `Write`; a missing row a caller named by id is `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Query,
    Write,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn query(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Query,
            message: message.into(),
        }
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Write,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            StoreErrorKind::Query => "db_query_failed",
            StoreErrorKind::Write => "db_write_failed",
            StoreErrorKind::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub full_name: String,
    pub matric_no: String,
    pub registered_level: i64,
    pub current_level: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRecord {
    pub id: String,
    pub user_id: String,
    pub level: i64,
    pub cgpa: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterRecord {
    pub id: String,
    pub level_id: String,
    pub semester: i64,
    pub gpa: Option<f64>,
    pub total_units: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub semester_id: String,
    pub code: String,
    pub unit: i64,
    pub grade: String,
    pub point: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub full_name: String,
    pub matric_no: String,
    pub registered_level: i64,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub semester_id: String,
    pub code: String,
    pub unit: i64,
    pub grade: String,
    pub point: i64,
}

/// Typed CRUD contract over the four dashboard tables. The hierarchy
/// handlers talk only to this trait; the bundled backend is SQLite, but
/// nothing above this line cares.
pub trait RecordStore {
    fn profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, StoreError>;
    fn insert_profile(&self, new: NewProfile) -> Result<ProfileRecord, StoreError>;
    fn set_current_level(&self, user_id: &str, level: i64) -> Result<(), StoreError>;

    /// Ascending by level number.
    fn levels_for_user(&self, user_id: &str) -> Result<Vec<LevelRecord>, StoreError>;
    fn level(&self, level_id: &str) -> Result<Option<LevelRecord>, StoreError>;
    fn insert_level(&self, user_id: &str, level: i64) -> Result<LevelRecord, StoreError>;
    fn set_level_cgpa(&self, level_id: &str, cgpa: f64) -> Result<(), StoreError>;

    /// Ascending by semester ordinal.
    fn semesters_for_level(&self, level_id: &str) -> Result<Vec<SemesterRecord>, StoreError>;
    /// Every semester belonging to the user, across all levels.
    fn semesters_for_user(&self, user_id: &str) -> Result<Vec<SemesterRecord>, StoreError>;
    fn semester(&self, semester_id: &str) -> Result<Option<SemesterRecord>, StoreError>;
    fn insert_semester(&self, level_id: &str, semester: i64) -> Result<SemesterRecord, StoreError>;
    fn set_semester_result(
        &self,
        semester_id: &str,
        gpa: f64,
        total_units: i64,
    ) -> Result<(), StoreError>;

    /// Ascending by creation time.
    fn courses_for_semester(&self, semester_id: &str) -> Result<Vec<CourseRecord>, StoreError>;
    fn insert_course(&self, new: NewCourse) -> Result<CourseRecord, StoreError>;
    fn delete_course(&self, course_id: &str) -> Result<(), StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl RecordStore for SqliteStore {
    fn profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, full_name, matric_no, registered_level, current_level
                 FROM profiles WHERE id = ?",
                [user_id],
                |r| {
                    Ok(ProfileRecord {
                        id: r.get(0)?,
                        full_name: r.get(1)?,
                        matric_no: r.get(2)?,
                        registered_level: r.get(3)?,
                        current_level: r.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(|e| StoreError::query(e.to_string()))
    }

    fn insert_profile(&self, new: NewProfile) -> Result<ProfileRecord, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO profiles(id, full_name, matric_no, registered_level, current_level)
                 VALUES(?, ?, ?, ?, ?)",
                (
                    &id,
                    &new.full_name,
                    &new.matric_no,
                    new.registered_level,
                    new.registered_level,
                ),
            )
            .map_err(|e| StoreError::write(e.to_string()))?;
        Ok(ProfileRecord {
            id,
            full_name: new.full_name,
            matric_no: new.matric_no,
            registered_level: new.registered_level,
            current_level: new.registered_level,
        })
    }

    fn set_current_level(&self, user_id: &str, level: i64) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE profiles SET current_level = ? WHERE id = ?",
                (level, user_id),
            )
            .map_err(|e| StoreError::write(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::not_found("profile not found"));
        }
        Ok(())
    }

    fn levels_for_user(&self, user_id: &str) -> Result<Vec<LevelRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, level, cgpa
                 FROM levels WHERE user_id = ? ORDER BY level",
            )
            .map_err(|e| StoreError::query(e.to_string()))?;
        stmt.query_map([user_id], |r| {
            Ok(LevelRecord {
                id: r.get(0)?,
                user_id: r.get(1)?,
                level: r.get(2)?,
                cgpa: r.get(3)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| StoreError::query(e.to_string()))
    }

    fn level(&self, level_id: &str) -> Result<Option<LevelRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, user_id, level, cgpa FROM levels WHERE id = ?",
                [level_id],
                |r| {
                    Ok(LevelRecord {
                        id: r.get(0)?,
                        user_id: r.get(1)?,
                        level: r.get(2)?,
                        cgpa: r.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(|e| StoreError::query(e.to_string()))
    }

    fn insert_level(&self, user_id: &str, level: i64) -> Result<LevelRecord, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO levels(id, user_id, level, cgpa) VALUES(?, ?, ?, 0)",
                (&id, user_id, level),
            )
            .map_err(|e| StoreError::write(e.to_string()))?;
        Ok(LevelRecord {
            id,
            user_id: user_id.to_string(),
            level,
            cgpa: 0.0,
        })
    }

    fn set_level_cgpa(&self, level_id: &str, cgpa: f64) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE levels SET cgpa = ? WHERE id = ?",
                (cgpa, level_id),
            )
            .map_err(|e| StoreError::write(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::not_found("level not found"));
        }
        Ok(())
    }

    fn semesters_for_level(&self, level_id: &str) -> Result<Vec<SemesterRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, level_id, semester, gpa, total_units
                 FROM semesters WHERE level_id = ? ORDER BY semester",
            )
            .map_err(|e| StoreError::query(e.to_string()))?;
        stmt.query_map([level_id], |r| {
            Ok(SemesterRecord {
                id: r.get(0)?,
                level_id: r.get(1)?,
                semester: r.get(2)?,
                gpa: r.get(3)?,
                total_units: r.get(4)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| StoreError::query(e.to_string()))
    }

    fn semesters_for_user(&self, user_id: &str) -> Result<Vec<SemesterRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT s.id, s.level_id, s.semester, s.gpa, s.total_units
                 FROM semesters s
                 JOIN levels l ON l.id = s.level_id
                 WHERE l.user_id = ?
                 ORDER BY l.level, s.semester",
            )
            .map_err(|e| StoreError::query(e.to_string()))?;
        stmt.query_map([user_id], |r| {
            Ok(SemesterRecord {
                id: r.get(0)?,
                level_id: r.get(1)?,
                semester: r.get(2)?,
                gpa: r.get(3)?,
                total_units: r.get(4)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| StoreError::query(e.to_string()))
    }

    fn semester(&self, semester_id: &str) -> Result<Option<SemesterRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, level_id, semester, gpa, total_units
                 FROM semesters WHERE id = ?",
                [semester_id],
                |r| {
                    Ok(SemesterRecord {
                        id: r.get(0)?,
                        level_id: r.get(1)?,
                        semester: r.get(2)?,
                        gpa: r.get(3)?,
                        total_units: r.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(|e| StoreError::query(e.to_string()))
    }

    fn insert_semester(&self, level_id: &str, semester: i64) -> Result<SemesterRecord, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO semesters(id, level_id, semester, gpa, total_units)
                 VALUES(?, ?, ?, NULL, 0)",
                (&id, level_id, semester),
            )
            .map_err(|e| StoreError::write(e.to_string()))?;
        Ok(SemesterRecord {
            id,
            level_id: level_id.to_string(),
            semester,
            gpa: None,
            total_units: 0,
        })
    }

    fn set_semester_result(
        &self,
        semester_id: &str,
        gpa: f64,
        total_units: i64,
    ) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE semesters SET gpa = ?, total_units = ? WHERE id = ?",
                (gpa, total_units, semester_id),
            )
            .map_err(|e| StoreError::write(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::not_found("semester not found"));
        }
        Ok(())
    }

    fn courses_for_semester(&self, semester_id: &str) -> Result<Vec<CourseRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, semester_id, code, unit, grade, point, created_at
                 FROM courses WHERE semester_id = ? ORDER BY created_at, rowid",
            )
            .map_err(|e| StoreError::query(e.to_string()))?;
        stmt.query_map([semester_id], |r| {
            Ok(CourseRecord {
                id: r.get(0)?,
                semester_id: r.get(1)?,
                code: r.get(2)?,
                unit: r.get(3)?,
                grade: r.get(4)?,
                point: r.get(5)?,
                created_at: r.get(6)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| StoreError::query(e.to_string()))
    }

    fn insert_course(&self, new: NewCourse) -> Result<CourseRecord, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO courses(id, semester_id, code, unit, grade, point, created_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                (
                    &id,
                    &new.semester_id,
                    &new.code,
                    new.unit,
                    &new.grade,
                    new.point,
                    &created_at,
                ),
            )
            .map_err(|e| StoreError::write(e.to_string()))?;
        Ok(CourseRecord {
            id,
            semester_id: new.semester_id,
            code: new.code,
            unit: new.unit,
            grade: new.grade,
            point: new.point,
            created_at,
        })
    }

    fn delete_course(&self, course_id: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM courses WHERE id = ?", [course_id])
            .map_err(|e| StoreError::write(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::not_found("course not found"));
        }
        Ok(())
    }
}
