//! Quiz scoring, attempts and timers

pub mod attempt;
pub mod countdown;
pub mod evaluate;
pub mod session;

pub use attempt::QuizAttempt;
pub use countdown::QuizCountdown;
pub use evaluate::{QuestionResult, QuizResult, evaluate, score_percent};
pub use session::QuizSession;
