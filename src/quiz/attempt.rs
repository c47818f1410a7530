//! In-progress quiz attempt

use std::collections::HashMap;

use crate::course::Quiz;

/// Answers selected so far and navigation state for one attempt
#[derive(Debug, Clone, Default)]
pub struct QuizAttempt {
    /// Quiz being attempted
    pub quiz_id: String,
    /// Question ids in display order
    question_ids: Vec<String>,
    /// Selected option per question
    answers: HashMap<String, String>,
    /// Index of the question on screen
    current: usize,
    /// Whether the attempt has been scored
    submitted: bool,
}

impl QuizAttempt {
    /// Start a fresh attempt
    pub fn new(quiz: &Quiz) -> Self {
        Self {
            quiz_id: quiz.id.clone(),
            question_ids: quiz.questions.iter().map(|q| q.id.clone()).collect(),
            ..Default::default()
        }
    }

    /// Select an option; ignored once submitted or for unknown questions
    pub fn select(&mut self, question_id: &str, option_id: &str) -> bool {
        if self.submitted || !self.question_ids.iter().any(|id| id == question_id) {
            return false;
        }
        self.answers.insert(question_id.to_string(), option_id.to_string());
        true
    }

    /// Select an option for the question currently on screen
    pub fn select_current(&mut self, option_id: &str) -> bool {
        match self.question_ids.get(self.current).cloned() {
            Some(question_id) => self.select(&question_id, option_id),
            None => false,
        }
    }

    pub fn answers(&self) -> &HashMap<String, String> {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn all_answered(&self) -> bool {
        self.question_ids.iter().all(|id| self.answers.contains_key(id))
    }

    pub fn question_count(&self) -> usize {
        self.question_ids.len()
    }

    /// Index of the question on screen
    pub fn current(&self) -> usize {
        self.current
    }

    /// Id of the question on screen
    pub fn current_question_id(&self) -> Option<&str> {
        self.question_ids.get(self.current).map(String::as_str)
    }

    /// Move to the next question, returning false at the end
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.question_ids.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous question, returning false at the start
    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a question index (clamped)
    pub fn go_to(&mut self, index: usize) {
        self.current = index.min(self.question_ids.len().saturating_sub(1));
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Freeze the attempt, returning false if it was already submitted
    pub fn mark_submitted(&mut self) -> bool {
        !std::mem::replace(&mut self.submitted, true)
    }

    /// Reopen an attempt whose submission was rejected, keeping its answers
    pub(crate) fn reset_submitted(&mut self) {
        self.submitted = false;
    }

    /// Clear answers and navigation for a retry
    pub fn reset(&mut self) {
        self.answers.clear();
        self.current = 0;
        self.submitted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::model::fixtures::quiz;

    #[test]
    fn select_records_answers() {
        let q = quiz("quiz", "c", &[10, 10], 50);
        let mut attempt = QuizAttempt::new(&q);
        assert!(attempt.select("q1", "q1-a"));
        assert!(attempt.select("q1", "q1-b"));
        assert!(!attempt.select("q9", "q9-a"));
        assert_eq!(attempt.answered_count(), 1);
        assert_eq!(attempt.answers()["q1"], "q1-b");
        assert!(!attempt.all_answered());
    }

    #[test]
    fn submitted_attempt_is_frozen() {
        let q = quiz("quiz", "c", &[10], 50);
        let mut attempt = QuizAttempt::new(&q);
        assert!(attempt.mark_submitted());
        assert!(!attempt.mark_submitted());
        assert!(!attempt.select("q1", "q1-a"));
    }

    #[test]
    fn navigation_is_bounded() {
        let q = quiz("quiz", "c", &[10, 10, 10], 50);
        let mut attempt = QuizAttempt::new(&q);
        assert!(!attempt.previous());
        assert!(attempt.next());
        assert!(attempt.next());
        assert!(!attempt.next());
        assert_eq!(attempt.current_question_id(), Some("q3"));
        attempt.go_to(10);
        assert_eq!(attempt.current(), 2);
        assert!(attempt.select_current("q3-a"));
        assert_eq!(attempt.answers()["q3"], "q3-a");
    }

    #[test]
    fn reset_clears_everything() {
        let q = quiz("quiz", "c", &[10, 10], 50);
        let mut attempt = QuizAttempt::new(&q);
        attempt.select("q1", "q1-a");
        attempt.next();
        attempt.mark_submitted();
        attempt.reset();
        assert_eq!(attempt.answered_count(), 0);
        assert_eq!(attempt.current(), 0);
        assert!(!attempt.is_submitted());
    }
}
