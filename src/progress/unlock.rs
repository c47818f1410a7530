//! Sequential lesson unlocking
//!
//! A lesson is reachable when the course is accessible and either it is the
//! first lesson or the lesson before it is completed. Administrative
//! overrides on a record take precedence over the sequential rule, but never
//! over the enrollment gate.

use std::collections::HashMap;

use super::record::{ProgressRecord, UnlockOverride};
use crate::course::Course;

/// Display status of a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStatus {
    Locked,
    Available,
    InProgress,
    Completed,
}

impl LessonStatus {
    /// Single-glyph indicator for list views
    pub fn glyph(&self) -> &'static str {
        match self {
            LessonStatus::Locked => "🔒",
            LessonStatus::Available => "○",
            LessonStatus::InProgress => "●",
            LessonStatus::Completed => "✓",
        }
    }
}

/// Whether lessons past the first may be opened at all
fn course_gate(course: &Course) -> (bool, bool) {
    let full_access = course.has_access();
    let first_open = full_access || course.free_preview;
    (first_open, full_access)
}

/// Ids of all reachable lessons, in position order
pub fn unlocked_lessons(course: &Course, records: &HashMap<String, ProgressRecord>) -> Vec<String> {
    let (first_open, full_access) = course_gate(course);
    let mut unlocked = Vec::new();
    let mut previous_completed = false;

    for (index, lesson) in course.ordered_lessons().into_iter().enumerate() {
        let record = records.get(&lesson.id);
        let open = match record.and_then(|r| r.unlock_override) {
            _ if !full_access => index == 0 && first_open,
            Some(UnlockOverride::Locked) => false,
            Some(UnlockOverride::Unlocked) => true,
            None => index == 0 || previous_completed,
        };

        if open {
            unlocked.push(lesson.id.clone());
        }
        previous_completed = record.is_some_and(|r| r.is_completed);
    }

    unlocked
}

/// Check if a single lesson is reachable
pub fn is_unlocked(
    course: &Course,
    records: &HashMap<String, ProgressRecord>,
    lesson_id: &str,
) -> bool {
    unlocked_lessons(course, records).iter().any(|id| id == lesson_id)
}

/// Status of every lesson, in position order
pub fn lesson_statuses(
    course: &Course,
    records: &HashMap<String, ProgressRecord>,
) -> Vec<(String, LessonStatus)> {
    let unlocked = unlocked_lessons(course, records);
    course
        .ordered_lessons()
        .into_iter()
        .map(|lesson| {
            let record = records.get(&lesson.id);
            let status = if record.is_some_and(|r| r.is_completed) {
                LessonStatus::Completed
            } else if !unlocked.contains(&lesson.id) {
                LessonStatus::Locked
            } else if record.is_some_and(|r| r.is_started()) {
                LessonStatus::InProgress
            } else {
                LessonStatus::Available
            };
            (lesson.id.clone(), status)
        })
        .collect()
}

/// Apply a force-unlock to a record
pub fn force_unlock(record: &mut ProgressRecord) {
    record.unlock_override = Some(UnlockOverride::Unlocked);
}

/// Apply a force-lock: removes any unlock and the completion flag
pub fn force_lock(record: &mut ProgressRecord) {
    *record = ProgressRecord {
        unlock_override: Some(UnlockOverride::Locked),
        last_updated: record.last_updated,
        ..Default::default()
    };
}

/// Apply a manual completion, lifting a force-lock if present
pub fn mark_complete(record: &mut ProgressRecord, now: i64) -> bool {
    if record.is_force_locked() {
        record.unlock_override = None;
    }
    let newly = record.complete(now);
    if newly {
        record.manually_completed = true;
    }
    newly
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::LessonKind;
    use crate::course::model::fixtures::{course, lesson};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn three_lessons() -> Course {
        course(
            "c",
            vec![
                lesson("l0", 0, LessonKind::Video, 10),
                lesson("l1", 1, LessonKind::Video, 10),
                lesson("l2", 2, LessonKind::Quiz, 10),
            ],
        )
    }

    fn completed() -> ProgressRecord {
        ProgressRecord { is_completed: true, ..Default::default() }
    }

    #[test]
    fn only_first_lesson_open_initially() {
        let c = three_lessons();
        assert_eq!(unlocked_lessons(&c, &HashMap::new()), vec!["l0"]);
    }

    #[test]
    fn completing_a_lesson_opens_the_next() {
        let c = three_lessons();
        let records = HashMap::from([("l0".to_string(), completed())]);
        assert_eq!(unlocked_lessons(&c, &records), vec!["l0", "l1"]);
    }

    #[test]
    fn gaps_do_not_cascade() {
        let c = three_lessons();
        // l1 completed by override while l0 is not: l2 opens but l1 does not
        let records = HashMap::from([("l1".to_string(), completed())]);
        assert_eq!(unlocked_lessons(&c, &records), vec!["l0", "l2"]);
    }

    #[test]
    fn unenrolled_course_locks_everything() {
        let mut c = three_lessons();
        c.enrolled = false;
        let mut unlocked = ProgressRecord::default();
        force_unlock(&mut unlocked);
        let records = HashMap::from([("l1".to_string(), unlocked)]);
        assert!(unlocked_lessons(&c, &records).is_empty());
    }

    #[test]
    fn free_preview_opens_only_first_lesson() {
        let mut c = three_lessons();
        c.enrolled = false;
        c.free_preview = true;
        let records = HashMap::from([("l0".to_string(), completed())]);
        assert_eq!(unlocked_lessons(&c, &records), vec!["l0"]);
    }

    #[test]
    fn purchased_counts_as_access() {
        let mut c = three_lessons();
        c.enrolled = false;
        c.purchased = true;
        assert_eq!(unlocked_lessons(&c, &HashMap::new()), vec!["l0"]);
    }

    #[test]
    fn force_unlock_bypasses_sequence() {
        let c = three_lessons();
        let mut record = ProgressRecord::default();
        force_unlock(&mut record);
        let records = HashMap::from([("l2".to_string(), record)]);
        assert!(is_unlocked(&c, &records, "l2"));
        assert!(!is_unlocked(&c, &records, "l1"));
    }

    #[test]
    fn force_lock_clears_completion_and_unlock() {
        let c = three_lessons();
        let mut l0 = completed();
        l0.watched_seconds = 600.0;
        force_lock(&mut l0);
        assert!(!l0.is_completed);
        assert_eq!(l0.watched_seconds, 0.0);

        let records = HashMap::from([("l0".to_string(), l0)]);
        assert!(unlocked_lessons(&c, &records).is_empty());
    }

    #[test]
    fn force_lock_beats_completed_predecessor() {
        let c = three_lessons();
        let mut l1 = ProgressRecord::default();
        force_lock(&mut l1);
        let records = HashMap::from([("l0".to_string(), completed()), ("l1".to_string(), l1)]);
        assert_eq!(unlocked_lessons(&c, &records), vec!["l0"]);
    }

    #[test]
    fn mark_complete_lifts_lock() {
        let mut record = ProgressRecord::default();
        force_lock(&mut record);
        assert!(mark_complete(&mut record, 10));
        assert!(record.is_completed);
        assert!(record.manually_completed);
        assert!(record.unlock_override.is_none());
        assert!(!mark_complete(&mut record, 20));
    }

    #[test]
    fn statuses_reflect_records() {
        let c = three_lessons();
        let records = HashMap::from([
            ("l0".to_string(), completed()),
            ("l1".to_string(), ProgressRecord { watched_seconds: 5.0, ..Default::default() }),
        ]);
        let statuses: Vec<LessonStatus> =
            lesson_statuses(&c, &records).into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            statuses,
            vec![LessonStatus::Completed, LessonStatus::InProgress, LessonStatus::Locked]
        );
    }

    proptest! {
        #[test]
        fn completing_never_locks_earlier_lessons(
            completed_mask in proptest::collection::vec(any::<bool>(), 6),
            target in 0usize..6,
        ) {
            let c = course(
                "c",
                (0..6).map(|i| lesson(&format!("l{i}"), i, LessonKind::Video, 10)).collect(),
            );
            let mut records: HashMap<String, ProgressRecord> = completed_mask
                .iter()
                .enumerate()
                .filter(|(_, done)| **done)
                .map(|(i, _)| (format!("l{i}"), completed()))
                .collect();

            let before = unlocked_lessons(&c, &records);
            records.insert(format!("l{target}"), completed());
            let after = unlocked_lessons(&c, &records);

            for id in &before {
                prop_assert!(after.contains(id), "{} was locked by completing l{}", id, target);
            }
            if target + 1 < 6 {
                let next = format!("l{}", target + 1);
                prop_assert!(after.contains(&next));
            }
        }
    }
}
