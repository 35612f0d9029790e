//! Client-side list reconciliation for optimistic writes.
//!
//! An optimistic add runs in three phases: a placeholder record with a
//! locally generated temporary id is spliced into the in-memory list, the
//! store write is issued, and the placeholder is then either swapped for the
//! server-confirmed record (matched by temporary id) or filtered back out.

use uuid::Uuid;

const TEMP_PREFIX: &str = "temp-";

pub fn placeholder_id() -> String {
    format!("{}{}", TEMP_PREFIX, Uuid::new_v4())
}

pub fn is_placeholder_id(id: &str) -> bool {
    id.starts_with(TEMP_PREFIX)
}

/// Records that can take part in optimistic reconciliation.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for crate::store::LevelRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for crate::store::SemesterRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Splice the placeholder into the list; phase one.
pub fn apply<T: Keyed>(items: &mut Vec<T>, placeholder: T) -> String {
    let temp_id = placeholder.key().to_string();
    items.push(placeholder);
    temp_id
}

/// Swap the placeholder for the confirmed record; phase two on success.
/// Returns false when no placeholder with that id remains (e.g. the list
/// was refetched underneath us), in which case the confirmed record is
/// appended so it is not lost.
pub fn confirm<T: Keyed>(items: &mut Vec<T>, temp_id: &str, confirmed: T) -> bool {
    match items.iter().position(|i| i.key() == temp_id) {
        Some(idx) => {
            items[idx] = confirmed;
            true
        }
        None => {
            items.push(confirmed);
            false
        }
    }
}

/// Filter the placeholder out; phase two on failure. No residue remains.
pub fn rollback<T: Keyed>(items: &mut Vec<T>, temp_id: &str) -> bool {
    let before = items.len();
    items.retain(|i| i.key() != temp_id);
    items.len() != before
}

/// Per-control duplicate-submission guard. One outstanding operation per
/// control; it does not serialize operations across different controls.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: bool,
}

impl InFlight {
    /// Claims the control. Returns false while a prior claim is unreleased.
    pub fn try_begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LevelRecord;

    fn record(id: &str, level: i64) -> LevelRecord {
        LevelRecord {
            id: id.to_string(),
            user_id: "user".into(),
            level,
            cgpa: 0.0,
        }
    }

    #[test]
    fn placeholder_ids_are_marked_and_unique() {
        let a = placeholder_id();
        let b = placeholder_id();
        assert!(is_placeholder_id(&a));
        assert_ne!(a, b);
        assert!(!is_placeholder_id("level-1"));
    }

    #[test]
    fn confirm_swaps_in_place() {
        let mut levels = vec![record("a", 100)];
        let temp = apply(&mut levels, record(&placeholder_id(), 200));
        assert_eq!(levels.len(), 2);

        assert!(confirm(&mut levels, &temp, record("b", 200)));
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].id, "b");
        assert!(!levels.iter().any(|l| is_placeholder_id(&l.id)));
    }

    #[test]
    fn rollback_leaves_no_residue() {
        let mut levels = vec![record("a", 100)];
        let temp = apply(&mut levels, record(&placeholder_id(), 200));

        assert!(rollback(&mut levels, &temp));
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].id, "a");
        // A second rollback finds nothing to remove.
        assert!(!rollback(&mut levels, &temp));
    }

    #[test]
    fn confirm_after_refetch_appends_instead_of_dropping() {
        let mut levels = vec![record("a", 100)];
        assert!(!confirm(&mut levels, "temp-gone", record("b", 200)));
        assert_eq!(levels.len(), 2);
    }

    #[test]
    fn in_flight_guard_blocks_double_submission() {
        let mut guard = InFlight::default();
        assert!(guard.try_begin());
        assert!(!guard.try_begin());
        guard.finish();
        assert!(guard.try_begin());
    }
}
