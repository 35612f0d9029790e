use crate::store::{LevelRecord, SemesterRecord};

pub const FIRST_LEVEL_STANDARD: i64 = 100;
pub const FIRST_LEVEL_DIRECT_ENTRY: i64 = 200;
pub const LEVEL_STEP: i64 = 100;
pub const MAX_SEMESTERS_PER_LEVEL: usize = 3;

/// A level is Open until its CGPA has been calculated at least once.
/// The cached `cgpa` column uses 0 for "not yet calculated".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelStatus {
    Open,
    Closed(f64),
}

impl LevelStatus {
    pub fn of(level: &LevelRecord) -> LevelStatus {
        if level.cgpa > 0.0 {
            LevelStatus::Closed(level.cgpa)
        } else {
            LevelStatus::Open
        }
    }
}

/// A semester is Open until its GPA trigger has recorded a unit total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SemesterStatus {
    Open,
    Closed { gpa: f64, total_units: i64 },
}

impl SemesterStatus {
    pub fn of(semester: &SemesterRecord) -> SemesterStatus {
        if semester.total_units > 0 {
            SemesterStatus::Closed {
                gpa: semester.gpa.unwrap_or(0.0),
                total_units: semester.total_units,
            }
        } else {
            SemesterStatus::Open
        }
    }
}

/// A gate violation: the operation was refused before any store call.
/// Always local and recoverable; rendered as an error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateError {
    pub code: &'static str,
    pub message: String,
}

impl GateError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Number for the next level, or why one may not be created.
///
/// Levels close strictly in sequence: a new one is allowed only when none
/// exist or the latest is Closed. The direct-entry branch is a one-time
/// choice consulted only for the very first level.
pub fn next_level_number(levels: &[LevelRecord], direct_entry: bool) -> Result<i64, GateError> {
    match levels.last() {
        None => Ok(if direct_entry {
            FIRST_LEVEL_DIRECT_ENTRY
        } else {
            FIRST_LEVEL_STANDARD
        }),
        Some(last) => match LevelStatus::of(last) {
            LevelStatus::Open => Err(GateError::new(
                "level_open",
                format!(
                    "calculate CGPA for {} Level before adding a new level",
                    last.level
                ),
            )),
            LevelStatus::Closed(_) => Ok(last.level + LEVEL_STEP),
        },
    }
}

/// Ordinal for the next semester of a level, or why one may not be created.
pub fn next_semester_ordinal(semesters: &[SemesterRecord]) -> Result<i64, GateError> {
    if semesters.len() >= MAX_SEMESTERS_PER_LEVEL {
        return Err(GateError::new(
            "semester_limit",
            format!("a level has at most {} semesters", MAX_SEMESTERS_PER_LEVEL),
        ));
    }
    match semesters.last() {
        None => Ok(1),
        Some(last) => match SemesterStatus::of(last) {
            SemesterStatus::Open => Err(GateError::new(
                "semester_open",
                "calculate GPA for the last semester first",
            )),
            SemesterStatus::Closed { .. } => Ok(last.semester + 1),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(level: i64, cgpa: f64) -> LevelRecord {
        LevelRecord {
            id: format!("lvl-{level}"),
            user_id: "user".into(),
            level,
            cgpa,
        }
    }

    fn semester(ordinal: i64, gpa: Option<f64>, total_units: i64) -> SemesterRecord {
        SemesterRecord {
            id: format!("sem-{ordinal}"),
            level_id: "lvl".into(),
            semester: ordinal,
            gpa,
            total_units,
        }
    }

    #[test]
    fn first_level_honors_entry_mode() {
        assert_eq!(next_level_number(&[], false), Ok(100));
        assert_eq!(next_level_number(&[], true), Ok(200));
    }

    #[test]
    fn open_level_blocks_the_next_one() {
        let err = next_level_number(&[level(100, 0.0)], false).expect_err("gate");
        assert_eq!(err.code, "level_open");
        assert!(err.message.contains("100 Level"));
    }

    #[test]
    fn closed_level_steps_by_100() {
        assert_eq!(next_level_number(&[level(100, 3.4)], false), Ok(200));
        assert_eq!(
            next_level_number(&[level(200, 4.1), level(300, 2.8)], false),
            Ok(400)
        );
    }

    #[test]
    fn direct_entry_flag_is_ignored_after_first_level() {
        assert_eq!(next_level_number(&[level(100, 3.0)], true), Ok(200));
    }

    #[test]
    fn first_semester_is_ordinal_one() {
        assert_eq!(next_semester_ordinal(&[]), Ok(1));
    }

    #[test]
    fn open_semester_blocks_the_next_one() {
        let err = next_semester_ordinal(&[semester(1, None, 0)]).expect_err("gate");
        assert_eq!(err.code, "semester_open");
        // The gate keys off total_units, not gpa: a gpa of 0 with recorded
        // units still closes the semester.
        assert_eq!(
            next_semester_ordinal(&[semester(1, Some(0.0), 12)]),
            Ok(2)
        );
    }

    #[test]
    fn gate_applies_at_any_count_below_the_cap() {
        let err = next_semester_ordinal(&[semester(1, Some(4.2), 15), semester(2, None, 0)])
            .expect_err("gate");
        assert_eq!(err.code, "semester_open");
    }

    #[test]
    fn fourth_semester_is_never_creatable() {
        let sems = vec![
            semester(1, Some(4.0), 15),
            semester(2, Some(3.5), 14),
            semester(3, Some(3.8), 16),
        ];
        let err = next_semester_ordinal(&sems).expect_err("cap");
        assert_eq!(err.code, "semester_limit");
    }

    #[test]
    fn statuses_mirror_the_cached_columns() {
        assert_eq!(LevelStatus::of(&level(100, 0.0)), LevelStatus::Open);
        assert_eq!(LevelStatus::of(&level(100, 4.6)), LevelStatus::Closed(4.6));
        assert_eq!(SemesterStatus::of(&semester(1, None, 0)), SemesterStatus::Open);
        assert_eq!(
            SemesterStatus::of(&semester(2, Some(3.1), 18)),
            SemesterStatus::Closed {
                gpa: 3.1,
                total_units: 18
            }
        );
    }
}
