//! A timed quiz attempt bound to the engine
//!
//! Answers and the submitted flag live behind one mutex shared with the
//! countdown, so a manual submit and an expiring timer can never both score
//! the same attempt.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::attempt::QuizAttempt;
use super::countdown::QuizCountdown;
use crate::course::Quiz;
use crate::engine::{EngineError, QuizOutcome, SharedEngine};
use crate::progress::StorageBackend;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// State shared between the session and its countdown
#[derive(Debug)]
struct Shared {
    attempt: QuizAttempt,
    outcome: Option<QuizOutcome>,
}

/// One learner's pass through a quiz lesson
pub struct QuizSession<B> {
    engine: SharedEngine<B>,
    course_id: String,
    lesson_id: String,
    quiz: Quiz,
    shared: Arc<Mutex<Shared>>,
    countdown: Option<QuizCountdown>,
}

impl<B: StorageBackend + Send + 'static> QuizSession<B> {
    /// Open a quiz lesson and start its timer, if it has one
    pub async fn begin(
        engine: SharedEngine<B>,
        course_id: &str,
        lesson_id: &str,
    ) -> Result<Self, EngineError> {
        let quiz = {
            let engine = engine.lock().await;
            let quiz = engine.catalog().quiz_for_lesson(course_id, lesson_id)?.clone();
            engine.accessible_lesson(course_id, lesson_id)?;
            quiz
        };

        let mut session = Self {
            engine,
            course_id: course_id.to_string(),
            lesson_id: lesson_id.to_string(),
            shared: Arc::new(Mutex::new(Shared { attempt: QuizAttempt::new(&quiz), outcome: None })),
            quiz,
            countdown: None,
        };
        session.start_countdown();
        tracing::debug!("Started quiz {} for {}/{}", session.quiz.id, course_id, lesson_id);
        Ok(session)
    }

    fn start_countdown(&mut self) {
        let Some(limit) = self.quiz.time_limit_seconds else {
            return;
        };
        let engine = self.engine.clone();
        let shared = self.shared.clone();
        let course_id = self.course_id.clone();
        let lesson_id = self.lesson_id.clone();

        self.countdown = Some(QuizCountdown::start(Duration::from_secs(limit), move || async move {
            match submit_shared(&engine, &shared, &course_id, &lesson_id).await {
                Ok(_) | Err(EngineError::QuizAlreadySubmitted) => {}
                Err(e) => tracing::warn!("Auto-submit of {} failed: {}", lesson_id, e),
            }
        }));
    }

    fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// Choose an option; ignored after submission
    pub fn select(&self, question_id: &str, option_id: &str) -> bool {
        lock(&self.shared).attempt.select(question_id, option_id)
    }

    /// Read or navigate the attempt
    pub fn with_attempt<R>(&self, f: impl FnOnce(&mut QuizAttempt) -> R) -> R {
        f(&mut lock(&self.shared).attempt)
    }

    pub fn is_submitted(&self) -> bool {
        lock(&self.shared).attempt.is_submitted()
    }

    /// Time left on the clock, if the quiz is timed and still running
    pub fn remaining(&self) -> Option<Duration> {
        self.countdown.as_ref().filter(|c| !c.is_finished()).map(QuizCountdown::remaining)
    }

    /// Result of the last scored attempt, whether submitted or timed out
    pub fn outcome(&self) -> Option<QuizOutcome> {
        lock(&self.shared).outcome.clone()
    }

    /// Score the current answers and stop the clock
    ///
    /// The clock keeps running if the engine refuses the attempt.
    pub async fn submit(&mut self) -> Result<QuizOutcome, EngineError> {
        let outcome = submit_shared(&self.engine, &self.shared, &self.course_id, &self.lesson_id).await?;
        self.cancel_countdown();
        Ok(outcome)
    }

    /// Wait for the timer to run out and return the auto-submitted outcome
    ///
    /// Returns None for untimed quizzes or a timer already stopped.
    pub async fn expired(&mut self) -> Option<QuizOutcome> {
        let countdown = self.countdown.take()?;
        if countdown.join().await { self.outcome() } else { None }
    }

    /// Clear the attempt and restart the timer
    pub fn retry(&mut self) {
        self.cancel_countdown();
        {
            let mut shared = lock(&self.shared);
            shared.attempt.reset();
            shared.outcome = None;
        }
        tracing::debug!("Retrying quiz {}", self.quiz.id);
        self.start_countdown();
    }
}

impl<B> std::fmt::Debug for QuizSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizSession")
            .field("course_id", &self.course_id)
            .field("lesson_id", &self.lesson_id)
            .field("quiz_id", &self.quiz.id)
            .finish()
    }
}

async fn submit_shared<B: StorageBackend>(
    engine: &SharedEngine<B>,
    shared: &Mutex<Shared>,
    course_id: &str,
    lesson_id: &str,
) -> Result<QuizOutcome, EngineError> {
    let answers = {
        let mut shared = lock(shared);
        if !shared.attempt.mark_submitted() {
            return Err(EngineError::QuizAlreadySubmitted);
        }
        shared.attempt.answers().clone()
    };

    let result = engine.lock().await.submit_quiz(course_id, lesson_id, &answers);
    let mut shared = lock(shared);
    match result {
        Ok(outcome) => {
            shared.outcome = Some(outcome.clone());
            Ok(outcome)
        }
        Err(e) => {
            // Not scored, so the learner may submit again
            shared.attempt.reset_submitted();
            Err(e)
        }
    }
}
