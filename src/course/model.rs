//! Fixture model for courses, lessons and quizzes
//!
//! These types are read-only inputs to the engine. They are loaded once from
//! JSON (built-in or user supplied) and never mutated by progress tracking.

use serde::{Deserialize, Serialize};

/// How a lesson is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    /// Watched in the video player, completed by watch percentage
    Video,
    /// Read in place, completed manually
    Reading,
    /// Completed by passing the linked quiz
    Quiz,
}

/// A single lesson in a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier within the course
    pub id: String,
    /// Display title
    pub title: String,
    /// Index in the course's lesson sequence (defines unlock order)
    pub position: usize,
    /// Duration in minutes
    pub duration: u32,
    /// Lesson type
    pub kind: LessonKind,
    /// XP credited once the lesson is completed
    pub xp: u32,
    /// External video reference for video lessons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_ref: Option<String>,
    /// Linked quiz for quiz lessons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_ref: Option<String>,
}

impl Lesson {
    /// Duration of the lesson in seconds
    pub fn duration_seconds(&self) -> f64 {
        f64::from(self.duration) * 60.0
    }

    pub fn is_video(&self) -> bool {
        self.kind == LessonKind::Video
    }

    pub fn is_quiz(&self) -> bool {
        self.kind == LessonKind::Quiz
    }
}

/// A course with its ordered lessons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Lessons ordered by position
    pub lessons: Vec<Lesson>,
    /// Advertised XP total (sum of lesson XP)
    pub total_xp: u32,
    /// Price in the store currency
    #[serde(default)]
    pub price: f64,
    /// User is enrolled
    #[serde(default)]
    pub enrolled: bool,
    /// User has purchased the course
    #[serde(default)]
    pub purchased: bool,
    /// First lesson is open even without enrollment
    #[serde(default)]
    pub free_preview: bool,
}

impl Course {
    /// Whether the user has access to the course content
    pub fn has_access(&self) -> bool {
        self.enrolled || self.purchased
    }

    /// Find a lesson by id
    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    /// Lessons sorted by position
    pub fn ordered_lessons(&self) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self.lessons.iter().collect();
        lessons.sort_by_key(|l| l.position);
        lessons
    }

    /// The lesson that follows the given one in unlock order
    pub fn next_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        let ordered = self.ordered_lessons();
        let idx = ordered.iter().position(|l| l.id == lesson_id)?;
        ordered.get(idx + 1).copied()
    }

    /// Sum of all lesson XP
    pub fn lesson_xp_sum(&self) -> u32 {
        self.lessons.iter().map(|l| l.xp).sum()
    }
}

/// One answer option of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// A single-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub options: Vec<QuizOption>,
    pub points: u32,
}

impl Question {
    /// Find an option by id
    pub fn option(&self, option_id: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// A quiz attached to a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub course_id: String,
    pub title: String,
    /// Questions in display order
    pub questions: Vec<Question>,
    /// XP reported on a passing attempt
    pub xp: u32,
    /// Minimum score percentage to pass (0-100)
    pub passing_score: u32,
    /// Countdown for the whole attempt, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<u64>,
}

impl Quiz {
    /// Find a question by id
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Total points available
    pub fn max_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-built fixtures shared by unit tests across the crate

    use super::*;

    pub fn lesson(id: &str, position: usize, kind: LessonKind, xp: u32) -> Lesson {
        Lesson {
            id: id.into(),
            title: format!("Lesson {id}"),
            position,
            duration: 10,
            kind,
            xp,
            video_ref: None,
            quiz_ref: if kind == LessonKind::Quiz { Some(format!("quiz-{id}")) } else { None },
        }
    }

    pub fn course(id: &str, lessons: Vec<Lesson>) -> Course {
        let total_xp = lessons.iter().map(|l| l.xp).sum();
        Course {
            id: id.into(),
            title: format!("Course {id}"),
            lessons,
            total_xp,
            price: 49.0,
            enrolled: true,
            purchased: false,
            free_preview: false,
        }
    }

    pub fn question(id: &str, points: u32) -> Question {
        Question {
            id: id.into(),
            prompt: format!("Question {id}?"),
            options: vec![
                QuizOption { id: format!("{id}-a"), text: "right".into(), is_correct: true },
                QuizOption { id: format!("{id}-b"), text: "wrong".into(), is_correct: false },
            ],
            points,
        }
    }

    pub fn quiz(id: &str, course_id: &str, points: &[u32], passing_score: u32) -> Quiz {
        Quiz {
            id: id.into(),
            course_id: course_id.into(),
            title: format!("Quiz {id}"),
            questions: points
                .iter()
                .enumerate()
                .map(|(i, p)| question(&format!("q{}", i + 1), *p))
                .collect(),
            xp: 10,
            passing_score,
            time_limit_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn duration_is_minutes() {
        let l = lesson("l0", 0, LessonKind::Video, 10);
        assert_eq!(l.duration_seconds(), 600.0);
    }

    #[test]
    fn next_lesson_follows_position_not_vec_order() {
        let c = course(
            "c",
            vec![
                lesson("b", 1, LessonKind::Video, 10),
                lesson("a", 0, LessonKind::Video, 10),
                lesson("c", 2, LessonKind::Quiz, 10),
            ],
        );
        assert_eq!(c.next_lesson("a").map(|l| l.id.as_str()), Some("b"));
        assert_eq!(c.next_lesson("b").map(|l| l.id.as_str()), Some("c"));
        assert!(c.next_lesson("c").is_none());
        assert!(c.next_lesson("missing").is_none());
    }

    #[test]
    fn lesson_kind_serializes_lowercase() {
        let json = serde_json::to_string(&LessonKind::Reading).unwrap();
        assert_eq!(json, "\"reading\"");
    }

    #[test]
    fn course_flags_default_to_false() {
        let json = r#"{"id":"c","title":"C","lessons":[],"total_xp":0}"#;
        let c: Course = serde_json::from_str(json).unwrap();
        assert!(!c.enrolled);
        assert!(!c.purchased);
        assert!(!c.free_preview);
        assert!(!c.has_access());
    }

    #[test]
    fn quiz_max_points_sums_questions() {
        let q = quiz("quiz", "c", &[10, 20, 5], 60);
        assert_eq!(q.max_points(), 35);
        assert!(q.question("q2").is_some());
        assert!(q.question("q2").unwrap().option("q2-a").unwrap().is_correct);
    }
}
