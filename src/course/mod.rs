//! Course and quiz fixtures

pub mod catalog;
pub mod model;

pub use catalog::Catalog;
pub use model::{Course, Lesson, LessonKind, Question, Quiz, QuizOption};
