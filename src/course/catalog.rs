//! Read-only course and quiz catalog
//!
//! Holds the fixture feed the engine reads lesson order and XP weights from.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::model::{Course, Lesson, Quiz};
use crate::engine::EngineError;

/// Fixtures bundled with the binary
const BUILTIN_CATALOG: &str = include_str!("../../fixtures/catalog.json");

/// All courses and quizzes known to the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Courses in display order
    pub courses: Vec<Course>,
    /// Quizzes referenced by quiz lessons
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

impl Catalog {
    /// Load the bundled fixture catalog
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("Failed to parse built-in catalog")
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {:?}", path))?;
        Self::from_json(&contents).with_context(|| format!("Failed to parse catalog {:?}", path))
    }

    /// Parse a catalog from a JSON string and log any fixture problems
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let catalog: Self = serde_json::from_str(json)?;
        for problem in catalog.validate() {
            tracing::warn!("Catalog: {}", problem);
        }
        Ok(catalog)
    }

    /// Find a course by id
    pub fn course(&self, course_id: &str) -> Result<&Course, EngineError> {
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .ok_or_else(|| EngineError::CourseNotFound(course_id.to_string()))
    }

    /// Find a lesson within a course
    pub fn lesson(&self, course_id: &str, lesson_id: &str) -> Result<&Lesson, EngineError> {
        self.course(course_id)?
            .lesson(lesson_id)
            .ok_or_else(|| EngineError::lesson_not_found(course_id, lesson_id))
    }

    /// Find a quiz by id
    pub fn quiz(&self, quiz_id: &str) -> Result<&Quiz, EngineError> {
        self.quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .ok_or_else(|| EngineError::QuizNotFound(quiz_id.to_string()))
    }

    /// Resolve the quiz linked to a quiz lesson
    pub fn quiz_for_lesson(&self, course_id: &str, lesson_id: &str) -> Result<&Quiz, EngineError> {
        let lesson = self.lesson(course_id, lesson_id)?;
        if !lesson.is_quiz() {
            return Err(EngineError::NotAQuizLesson {
                course_id: course_id.into(),
                lesson_id: lesson_id.into(),
            });
        }
        let quiz_id = lesson
            .quiz_ref
            .as_deref()
            .ok_or_else(|| EngineError::QuizNotFound(format!("<none for lesson {lesson_id}>")))?;
        self.quiz(quiz_id)
    }

    /// All quizzes belonging to a course
    pub fn quizzes_for_course(&self, course_id: &str) -> Vec<&Quiz> {
        self.quizzes.iter().filter(|q| q.course_id == course_id).collect()
    }

    /// Courses the user is enrolled in or has purchased
    pub fn accessible_courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter().filter(|c| c.has_access())
    }

    /// Check fixture consistency, returning a description of each problem
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let quiz_ids: HashSet<&str> = self.quizzes.iter().map(|q| q.id.as_str()).collect();

        for course in &self.courses {
            let mut positions: Vec<usize> = course.lessons.iter().map(|l| l.position).collect();
            positions.sort_unstable();
            if positions.iter().enumerate().any(|(i, p)| i != *p) {
                problems.push(format!(
                    "course {} has lesson positions {:?}, expected 0..{}",
                    course.id,
                    positions,
                    course.lessons.len()
                ));
            }

            let xp_sum = course.lesson_xp_sum();
            if xp_sum != course.total_xp {
                problems.push(format!(
                    "course {} advertises {} XP but its lessons sum to {}",
                    course.id, course.total_xp, xp_sum
                ));
            }

            for lesson in course.lessons.iter().filter(|l| l.is_quiz()) {
                match lesson.quiz_ref.as_deref() {
                    Some(id) if quiz_ids.contains(id) => {
                        if let Ok(quiz) = self.quiz(id) {
                            if quiz.xp != lesson.xp {
                                problems.push(format!(
                                    "lesson {} credits {} XP but quiz {} reports {}",
                                    lesson.id, lesson.xp, quiz.id, quiz.xp
                                ));
                            }
                        }
                    }
                    Some(id) => problems.push(format!(
                        "lesson {} references unknown quiz {}",
                        lesson.id, id
                    )),
                    None => problems.push(format!("quiz lesson {} has no quiz", lesson.id)),
                }
            }
        }

        for quiz in &self.quizzes {
            if quiz.max_points() == 0 {
                problems.push(format!("quiz {} has no points to earn", quiz.id));
            }
        }

        problems
    }
}
