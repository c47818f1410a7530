//! Error types for the course progress engine

use thiserror::Error;

use crate::tracker::PlaybackError;

/// Errors that can occur while tracking course progress
#[derive(Debug, Error)]
pub enum EngineError {
    /// No course with this id in the catalog
    #[error("Course not found: {0}")]
    CourseNotFound(String),

    /// The course exists but has no such lesson
    #[error("Lesson {lesson_id} not found in course {course_id}")]
    LessonNotFound {
        /// Course that was searched
        course_id: String,
        /// Missing lesson id
        lesson_id: String,
    },

    /// No quiz with this id in the catalog
    #[error("Quiz not found: {0}")]
    QuizNotFound(String),

    /// The lesson is not reachable yet
    #[error("Lesson {lesson_id} in course {course_id} is locked")]
    LessonLocked {
        /// Course of the locked lesson
        course_id: String,
        /// Locked lesson id
        lesson_id: String,
    },

    /// A quiz was submitted against a lesson that is not a quiz
    #[error("Lesson {lesson_id} in course {course_id} is not a quiz lesson")]
    NotAQuizLesson {
        /// Course of the lesson
        course_id: String,
        /// Lesson id
        lesson_id: String,
    },

    /// Playback was credited to a lesson that is not a video
    #[error("Lesson {lesson_id} in course {course_id} is not a video lesson")]
    NotAVideoLesson {
        /// Course of the lesson
        course_id: String,
        /// Lesson id
        lesson_id: String,
    },

    /// The attempt was already submitted and must be reset first
    #[error("Quiz attempt already submitted")]
    QuizAlreadySubmitted,

    /// The playback source failed while sampling
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Filesystem error from a file-backed store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Check if this error is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::CourseNotFound(_)
                | EngineError::LessonNotFound { .. }
                | EngineError::QuizNotFound(_)
        )
    }

    /// Check if this error means the lesson is gated
    pub fn is_locked(&self) -> bool {
        matches!(self, EngineError::LessonLocked { .. })
    }

    pub(crate) fn lesson_not_found(course_id: &str, lesson_id: &str) -> Self {
        EngineError::LessonNotFound { course_id: course_id.into(), lesson_id: lesson_id.into() }
    }

    pub(crate) fn not_a_video(course_id: &str, lesson_id: &str) -> Self {
        EngineError::NotAVideoLesson { course_id: course_id.into(), lesson_id: lesson_id.into() }
    }

    pub(crate) fn locked(course_id: &str, lesson_id: &str) -> Self {
        EngineError::LessonLocked { course_id: course_id.into(), lesson_id: lesson_id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_misses_are_not_found() {
        assert!(EngineError::CourseNotFound("c".into()).is_not_found());
        assert!(EngineError::lesson_not_found("c", "l").is_not_found());
        assert!(EngineError::QuizNotFound("q".into()).is_not_found());
        assert!(!EngineError::locked("c", "l").is_not_found());
    }

    #[test]
    fn locked_message_names_lesson() {
        let err = EngineError::locked("python", "l2");
        assert!(err.is_locked());
        assert_eq!(err.to_string(), "Lesson l2 in course python is locked");
    }
}
