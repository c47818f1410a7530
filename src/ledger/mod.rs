//! XP aggregation and levels
//!
//! Everything here is a pure function of the course fixtures and the stored
//! progress records. Nothing is cached or persisted.

pub mod achievements;
pub mod levels;

use std::collections::HashMap;

use serde::Serialize;

use crate::course::Course;
use crate::progress::ProgressRecord;

pub use achievements::{Badge, BadgeRarity, LearnerStats, Milestone};
pub use levels::{Level, LevelProgress, LevelTable, Reward, RewardKind};

/// Records of one course, keyed by lesson id
pub type CourseRecords = HashMap<String, ProgressRecord>;

/// Records of every course, keyed by course id
pub type ProgressSnapshot = HashMap<String, CourseRecords>;

/// XP earned in one course from completed lessons
pub fn course_xp(course: &Course, records: &CourseRecords) -> u64 {
    course
        .lessons
        .iter()
        .filter(|l| records.get(&l.id).is_some_and(|r| r.is_completed))
        .map(|l| u64::from(l.xp))
        .sum()
}

/// XP across every course the user is enrolled in or has purchased
pub fn total_xp(courses: &[Course], snapshot: &ProgressSnapshot) -> u64 {
    courses
        .iter()
        .filter(|c| c.has_access())
        .filter_map(|c| snapshot.get(&c.id).map(|records| course_xp(c, records)))
        .sum()
}

/// Percentage of a course's lessons completed
pub fn course_progress(course: &Course, records: &CourseRecords) -> f64 {
    if course.lessons.is_empty() {
        return 0.0;
    }
    let completed = completed_count(course, records);
    completed as f64 / course.lessons.len() as f64 * 100.0
}

fn completed_count(course: &Course, records: &CourseRecords) -> usize {
    course.lessons.iter().filter(|l| records.get(&l.id).is_some_and(|r| r.is_completed)).count()
}

/// Per-course totals for the learning view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub course_id: String,
    pub title: String,
    pub earned_xp: u64,
    pub total_xp: u64,
    pub completed_lessons: usize,
    pub lesson_count: usize,
    pub percent: f64,
    /// Unix timestamp the course first reached 100%
    pub completed_at: Option<i64>,
}

impl CourseSummary {
    pub fn new(course: &Course, records: &CourseRecords, completed_at: Option<i64>) -> Self {
        Self {
            course_id: course.id.clone(),
            title: course.title.clone(),
            earned_xp: course_xp(course, records),
            total_xp: u64::from(course.total_xp),
            completed_lessons: completed_count(course, records),
            lesson_count: course.lessons.len(),
            percent: course_progress(course, records),
            completed_at,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.lesson_count > 0 && self.completed_lessons == self.lesson_count
    }

    /// A certificate needs full progress and a recorded completion date
    pub fn is_certificate_eligible(&self) -> bool {
        self.is_complete() && self.completed_at.is_some()
    }
}

/// Derived level state of the learner
#[derive(Debug, Clone, PartialEq)]
pub struct UserLevelState {
    pub total_xp: u64,
    pub level: Level,
    pub next: Option<Level>,
    /// Percentage toward `next`
    pub percent: f64,
    /// Rewards of every level reached
    pub rewards: Vec<Reward>,
}

impl UserLevelState {
    pub fn compute(table: &LevelTable, total_xp: u64) -> Self {
        let progress = table.progress_to_next(total_xp);
        Self {
            total_xp,
            level: progress.current.clone(),
            next: progress.next.cloned(),
            percent: progress.percent,
            rewards: table.rewards_unlocked(total_xp).into_iter().cloned().collect(),
        }
    }

    pub fn xp_to_next(&self) -> Option<u64> {
        self.next.as_ref().map(|n| n.min_xp.saturating_sub(self.total_xp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::LessonKind;
    use crate::course::model::fixtures::{course, lesson};
    use pretty_assertions::assert_eq;

    fn done() -> ProgressRecord {
        ProgressRecord { is_completed: true, ..Default::default() }
    }

    fn xp_course(id: &str) -> Course {
        course(
            id,
            vec![
                lesson("a", 0, LessonKind::Video, 50),
                lesson("b", 1, LessonKind::Video, 75),
                lesson("c", 2, LessonKind::Quiz, 100),
            ],
        )
    }

    #[test]
    fn only_completed_lessons_count() {
        let c = xp_course("c");
        let records = HashMap::from([
            ("a".to_string(), done()),
            ("b".to_string(), done()),
            ("c".to_string(), ProgressRecord { watched_seconds: 100.0, ..Default::default() }),
        ]);
        assert_eq!(course_xp(&c, &records), 125);
    }

    #[test]
    fn unenrolled_courses_do_not_count() {
        let enrolled = xp_course("x");
        let mut browsing = xp_course("y");
        browsing.enrolled = false;

        let snapshot = ProgressSnapshot::from([
            ("x".to_string(), HashMap::from([("a".to_string(), done())])),
            ("y".to_string(), HashMap::from([("a".to_string(), done())])),
        ]);
        assert_eq!(total_xp(&[enrolled, browsing], &snapshot), 50);
    }

    #[test]
    fn course_progress_percent() {
        let c = xp_course("c");
        let records = HashMap::from([("a".to_string(), done())]);
        let pct = course_progress(&c, &records);
        assert!((pct - 33.333).abs() < 0.01);
        assert_eq!(course_progress(&course("empty", vec![]), &records), 0.0);
    }

    #[test]
    fn summary_requires_completion_date_for_certificate() {
        let c = xp_course("c");
        let records: CourseRecords =
            ["a", "b", "c"].iter().map(|id| (id.to_string(), done())).collect();

        let without_date = CourseSummary::new(&c, &records, None);
        assert!(without_date.is_complete());
        assert!(!without_date.is_certificate_eligible());

        let with_date = CourseSummary::new(&c, &records, Some(1));
        assert!(with_date.is_certificate_eligible());
        assert_eq!(with_date.earned_xp, 225);
        assert_eq!(with_date.percent, 100.0);
    }

    #[test]
    fn level_state_reports_rewards() {
        let state = UserLevelState::compute(&LevelTable::default(), 1000);
        assert_eq!(state.level.level, 2);
        assert_eq!(state.rewards.len(), 3);
        assert_eq!(state.xp_to_next(), Some(1500));
        assert_eq!(state.percent, 0.0);
    }
}
