use serde::Serialize;

/// 2-decimal display rounding used everywhere a GPA/CGPA is shown:
/// `floor(100*x + 0.5) / 100`. Persisted values stay raw.
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// One course as the engine sees it: the stored grade point and the credit
/// weight. Identity and code are irrelevant to aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseWeight {
    pub point: i64,
    pub unit: i64,
}

/// One semester as weighted input to a CGPA: the cached GPA and the unit
/// total recorded when it was last calculated. `gpa = None` means the
/// semester has never been calculated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemesterWeight {
    pub gpa: Option<f64>,
    pub total_units: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterResult {
    pub gpa: f64,
    pub total_units: i64,
}

/// Unit-weighted GPA over one semester's courses.
///
/// An empty course list is an explicit error rather than a zero result so
/// the calculate trigger can tell the user to add courses first.
pub fn semester_gpa<I>(courses: I) -> Result<SemesterResult, CalcError>
where
    I: IntoIterator<Item = CourseWeight>,
{
    let mut total_points: i64 = 0;
    let mut total_units: i64 = 0;
    let mut seen = false;

    for c in courses {
        seen = true;
        total_points += c.point * c.unit;
        total_units += c.unit;
    }

    if !seen {
        return Err(CalcError::new("no_courses", "add courses first"));
    }

    let gpa = if total_units > 0 {
        total_points as f64 / total_units as f64
    } else {
        0.0
    };

    Ok(SemesterResult { gpa, total_units })
}

/// Unit-weighted CGPA over a set of semesters. Semesters that were never
/// calculated (`total_units == 0` or no cached GPA) contribute no weight.
/// Zero total weight yields 0, never a division by zero.
pub fn weighted_cgpa<I>(semesters: I) -> f64
where
    I: IntoIterator<Item = SemesterWeight>,
{
    let mut points = 0.0_f64;
    let mut units: i64 = 0;

    for s in semesters {
        let Some(gpa) = s.gpa else {
            continue;
        };
        if s.total_units <= 0 {
            continue;
        }
        points += gpa * s.total_units as f64;
        units += s.total_units;
    }

    if units > 0 {
        points / units as f64
    } else {
        0.0
    }
}

/// Degree classification bands for the 5-point scale.
pub fn degree_class(cgpa: f64) -> &'static str {
    if cgpa < 1.0 {
        "Fail"
    } else if cgpa < 1.5 {
        "Pass"
    } else if cgpa < 2.5 {
        "Third Class"
    } else if cgpa < 3.5 {
        "Second Class Lower"
    } else if cgpa < 4.5 {
        "Second Class Upper"
    } else if cgpa <= 5.0 {
        "First Class"
    } else {
        "Nil"
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeSummary {
    pub levels: usize,
    pub semesters: usize,
    pub total_units: i64,
    pub total_points: i64,
    pub cgpa: f64,
    pub degree_class: &'static str,
}

/// Account-wide summary computed straight from course rows grouped by level
/// and semester. Display only; never written back to any level.
pub fn cumulative_summary(levels: &[Vec<Vec<CourseWeight>>]) -> CumulativeSummary {
    let mut semesters = 0_usize;
    let mut total_units: i64 = 0;
    let mut total_points: i64 = 0;

    for level in levels {
        for semester in level {
            semesters += 1;
            for c in semester {
                total_units += c.unit;
                total_points += c.point * c.unit;
            }
        }
    }

    let cgpa = if total_units > 0 {
        total_points as f64 / total_units as f64
    } else {
        0.0
    };

    CumulativeSummary {
        levels: levels.len(),
        semesters,
        total_units,
        total_points,
        cgpa,
        degree_class: degree_class(cgpa),
    }
}
