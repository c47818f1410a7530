//! Badges and milestones derived from progress

use std::collections::HashMap;

use serde::Serialize;

use super::ProgressSnapshot;
use crate::course::Course;

const SECONDS_PER_DAY: i64 = 86_400;

/// How rare a badge is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rarity: BadgeRarity,
    pub earned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Progress so far, clamped to `target`
    pub progress: u32,
    pub target: u32,
    pub reward: &'static str,
    pub completed: bool,
}

impl Milestone {
    pub fn remaining(&self) -> u32 {
        self.target - self.progress
    }
}

/// Counters the achievement rules are evaluated against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerStats {
    pub completed_lessons: usize,
    /// Most lessons completed on a single UTC day
    pub best_day_completions: usize,
    pub completed_courses: usize,
    pub enrolled_courses: usize,
    pub perfect_quizzes: usize,
    pub reached_top_level: bool,
}

impl LearnerStats {
    /// Gather counters over accessible courses
    pub fn collect(courses: &[Course], snapshot: &ProgressSnapshot, reached_top_level: bool) -> Self {
        let mut stats = Self { reached_top_level, ..Default::default() };
        let mut per_day: HashMap<i64, usize> = HashMap::new();

        for course in courses.iter().filter(|c| c.has_access()) {
            stats.enrolled_courses += 1;
            let Some(records) = snapshot.get(&course.id) else {
                continue;
            };

            let mut course_done = !course.lessons.is_empty();
            for lesson in &course.lessons {
                let Some(record) = records.get(&lesson.id) else {
                    course_done = false;
                    continue;
                };
                if record.score_percent == Some(100) {
                    stats.perfect_quizzes += 1;
                }
                if !record.is_completed {
                    course_done = false;
                    continue;
                }
                stats.completed_lessons += 1;
                if let Some(at) = record.completed_at {
                    *per_day.entry(at.div_euclid(SECONDS_PER_DAY)).or_default() += 1;
                }
            }
            if course_done {
                stats.completed_courses += 1;
            }
        }

        stats.best_day_completions = per_day.into_values().max().unwrap_or(0);
        stats
    }
}

/// Evaluate every badge rule
pub fn badges(stats: &LearnerStats) -> Vec<Badge> {
    vec![
        Badge {
            id: "first-step",
            name: "First Step",
            description: "Complete your first lesson",
            icon: "🎯",
            rarity: BadgeRarity::Common,
            earned: stats.completed_lessons >= 1,
        },
        Badge {
            id: "fast-learner",
            name: "Fast Learner",
            description: "Complete 5 lessons in one day",
            icon: "⚡",
            rarity: BadgeRarity::Rare,
            earned: stats.best_day_completions >= 5,
        },
        Badge {
            id: "course-conqueror",
            name: "Course Conqueror",
            description: "Complete your first course",
            icon: "🏆",
            rarity: BadgeRarity::Epic,
            earned: stats.completed_courses >= 1,
        },
        Badge {
            id: "knowledge-seeker",
            name: "Knowledge Seeker",
            description: "Enroll in 5 different courses",
            icon: "📚",
            rarity: BadgeRarity::Rare,
            earned: stats.enrolled_courses >= 5,
        },
        Badge {
            id: "perfect-score",
            name: "Perfect Score",
            description: "Get 100% on a quiz",
            icon: "💯",
            rarity: BadgeRarity::Epic,
            earned: stats.perfect_quizzes >= 1,
        },
        Badge {
            id: "summit",
            name: "Summit",
            description: "Reach the highest level",
            icon: "🧠",
            rarity: BadgeRarity::Legendary,
            earned: stats.reached_top_level,
        },
    ]
}

fn milestone(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    count: usize,
    target: u32,
    reward: &'static str,
) -> Milestone {
    let progress = u32::try_from(count).unwrap_or(u32::MAX).min(target);
    Milestone { id, title, description, progress, target, reward, completed: progress >= target }
}

/// Evaluate every milestone
pub fn milestones(stats: &LearnerStats) -> Vec<Milestone> {
    let earned_badges = badges(stats).iter().filter(|b| b.earned).count();
    vec![
        milestone(
            "ten-lessons",
            "Complete 10 Lessons",
            "Finish 10 lessons across any courses",
            stats.completed_lessons,
            10,
            "+500 XP",
        ),
        milestone(
            "three-courses",
            "Complete 3 Courses",
            "Finish 3 complete courses",
            stats.completed_courses,
            3,
            "+1000 XP",
        ),
        milestone(
            "five-badges",
            "Earn 5 Badges",
            "Unlock 5 achievement badges",
            earned_badges,
            5,
            "Special Avatar Frame",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::LessonKind;
    use crate::course::model::fixtures::{course, lesson};
    use crate::progress::ProgressRecord;
    use pretty_assertions::assert_eq;

    fn done_at(at: i64) -> ProgressRecord {
        ProgressRecord { is_completed: true, completed_at: Some(at), ..Default::default() }
    }

    fn six_lesson_course(id: &str) -> Course {
        course(id, (0..6).map(|i| lesson(&format!("l{i}"), i, LessonKind::Video, 10)).collect())
    }

    #[test]
    fn empty_snapshot_earns_nothing() {
        let stats = LearnerStats::collect(&[six_lesson_course("c")], &HashMap::new(), false);
        assert_eq!(stats.enrolled_courses, 1);
        assert!(badges(&stats).iter().all(|b| !b.earned));
    }

    #[test]
    fn same_day_completions_earn_fast_learner() {
        let c = six_lesson_course("c");
        let day = 19_000 * SECONDS_PER_DAY;
        let records =
            (0..5).map(|i| (format!("l{i}"), done_at(day + i * 60))).collect::<HashMap<_, _>>();
        let snapshot = ProgressSnapshot::from([("c".to_string(), records)]);

        let stats = LearnerStats::collect(&[c], &snapshot, false);
        assert_eq!(stats.completed_lessons, 5);
        assert_eq!(stats.best_day_completions, 5);
        assert_eq!(stats.completed_courses, 0);

        let earned: Vec<&str> = badges(&stats).iter().filter(|b| b.earned).map(|b| b.id).collect();
        assert_eq!(earned, vec!["first-step", "fast-learner"]);
    }

    #[test]
    fn completions_across_days_do_not_count_as_one_day() {
        let c = six_lesson_course("c");
        let records = (0..5)
            .map(|i| (format!("l{i}"), done_at(i * SECONDS_PER_DAY)))
            .collect::<HashMap<_, _>>();
        let snapshot = ProgressSnapshot::from([("c".to_string(), records)]);
        let stats = LearnerStats::collect(&[c], &snapshot, false);
        assert_eq!(stats.best_day_completions, 1);
    }

    #[test]
    fn full_course_and_perfect_quiz() {
        let c = six_lesson_course("c");
        let mut records =
            (0..6).map(|i| (format!("l{i}"), done_at(i * SECONDS_PER_DAY))).collect::<HashMap<_, _>>();
        records.get_mut("l5").unwrap().score_percent = Some(100);
        let snapshot = ProgressSnapshot::from([("c".to_string(), records)]);

        let stats = LearnerStats::collect(&[c], &snapshot, true);
        assert_eq!(stats.completed_courses, 1);
        assert_eq!(stats.perfect_quizzes, 1);

        let earned = badges(&stats).iter().filter(|b| b.earned).count();
        assert_eq!(earned, 4);
    }

    #[test]
    fn milestones_clamp_progress() {
        let stats = LearnerStats { completed_lessons: 14, completed_courses: 1, ..Default::default() };
        let ms = milestones(&stats);
        assert_eq!(ms[0].progress, 10);
        assert!(ms[0].completed);
        assert_eq!(ms[1].remaining(), 2);
        assert!(!ms[1].completed);
        // first-step and course-conqueror
        assert_eq!(ms[2].progress, 2);
    }
}
