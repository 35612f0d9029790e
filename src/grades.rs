use serde::{Deserialize, Serialize};

/// Letter grades on the 5-point scale used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    /// Fixed mapping: A=5 down to F=0. Looked up once at course creation;
    /// stored on the row and never recomputed.
    pub fn point(self) -> i64 {
        match self {
            Grade::A => 5,
            Grade::B => 4,
            Grade::C => 3,
            Grade::D => 2,
            Grade::E => 1,
            Grade::F => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }

    /// Case-insensitive parse from form input.
    pub fn parse(input: &str) -> Option<Grade> {
        match input.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            "E" => Some(Grade::E),
            "F" => Some(Grade::F),
            _ => None,
        }
    }
}

/// Normalize a course code to uppercase `LLL NNN`.
///
/// Accepted input is three ASCII letters, an optional single space, then
/// three ASCII digits, in any letter case. Anything else is rejected; the
/// caller reports it as a validation error. Duplicate codes within a
/// semester are deliberately allowed.
pub fn normalize_course_code(input: &str) -> Option<String> {
    let chars: Vec<char> = input.trim().chars().collect();

    let (letters, digits) = match chars.len() {
        6 => (&chars[..3], &chars[3..]),
        7 if chars[3] == ' ' => (&chars[..3], &chars[4..]),
        _ => return None,
    };

    if !letters.iter().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !digits.iter().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut out = String::with_capacity(7);
    for c in letters {
        out.push(c.to_ascii_uppercase());
    }
    out.push(' ');
    for c in digits {
        out.push(*c);
    }
    Some(out)
}

/// Credit weight must be a positive integer.
pub fn validate_unit(unit: i64) -> Option<i64> {
    if unit > 0 {
        Some(unit)
    } else {
        None
    }
}
