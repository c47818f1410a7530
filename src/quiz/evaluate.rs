//! Quiz scoring

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::course::Quiz;

/// Correctness of a single question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    /// Selected option, if the question was answered
    pub selected: Option<String>,
    pub correct: bool,
    pub points: u32,
}

/// Score of a submitted attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub earned_points: u32,
    pub max_points: u32,
    /// Rounded percentage (0-100)
    pub score_percent: u32,
    pub passed: bool,
    /// Per-question review, in question order
    pub questions: Vec<QuestionResult>,
}

impl QuizResult {
    pub fn correct_count(&self) -> usize {
        self.questions.iter().filter(|q| q.correct).count()
    }

    pub fn is_perfect(&self) -> bool {
        self.score_percent == 100
    }
}

/// Rounded percentage of earned over max, 0 when nothing can be earned
pub fn score_percent(earned_points: u32, max_points: u32) -> u32 {
    if max_points == 0 {
        return 0;
    }
    (f64::from(earned_points) / f64::from(max_points) * 100.0).round() as u32
}

/// Score answers (question id -> option id) against the quiz's key
///
/// Unanswered questions and unknown option ids score zero.
pub fn evaluate(quiz: &Quiz, answers: &HashMap<String, String>) -> QuizResult {
    let questions: Vec<QuestionResult> = quiz
        .questions
        .iter()
        .map(|question| {
            let selected = answers.get(&question.id).cloned();
            let correct = selected
                .as_deref()
                .and_then(|id| question.option(id))
                .is_some_and(|option| option.is_correct);
            QuestionResult {
                question_id: question.id.clone(),
                selected,
                correct,
                points: question.points,
            }
        })
        .collect();

    let earned_points = questions.iter().filter(|q| q.correct).map(|q| q.points).sum();
    let max_points = quiz.max_points();
    let score_percent = score_percent(earned_points, max_points);

    QuizResult {
        earned_points,
        max_points,
        score_percent,
        passed: score_percent >= quiz.passing_score,
        questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::model::fixtures::quiz;
    use pretty_assertions::assert_eq;

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(q, o)| (q.to_string(), o.to_string())).collect()
    }

    #[test]
    fn three_of_four_passes_at_seventy() {
        let q = quiz("quiz", "c", &[10, 10, 10, 10], 70);
        let result =
            evaluate(&q, &answers(&[("q1", "q1-a"), ("q2", "q2-a"), ("q3", "q3-a"), ("q4", "q4-b")]));
        assert_eq!(result.earned_points, 30);
        assert_eq!(result.score_percent, 75);
        assert!(result.passed);
        assert_eq!(result.correct_count(), 3);
    }

    #[test]
    fn two_of_four_fails_at_seventy() {
        let q = quiz("quiz", "c", &[10, 10, 10, 10], 70);
        let result = evaluate(&q, &answers(&[("q1", "q1-a"), ("q2", "q2-a")]));
        assert_eq!(result.score_percent, 50);
        assert!(!result.passed);
    }

    #[test]
    fn unanswered_and_unknown_options_score_zero() {
        let q = quiz("quiz", "c", &[10, 10], 50);
        let result = evaluate(&q, &answers(&[("q1", "bogus")]));
        assert_eq!(result.earned_points, 0);
        assert_eq!(result.questions[0].selected.as_deref(), Some("bogus"));
        assert!(!result.questions[0].correct);
        assert_eq!(result.questions[1].selected, None);
    }

    #[test]
    fn zero_point_quiz_scores_zero() {
        let q = quiz("quiz", "c", &[], 0);
        let result = evaluate(&q, &HashMap::new());
        assert_eq!(result.score_percent, 0);
        assert_eq!(result.max_points, 0);
        // A zero passing score still passes an empty quiz
        assert!(result.passed);
    }

    #[test]
    fn weighted_questions_round_half_up() {
        let q = quiz("quiz", "c", &[1, 1, 1], 60);
        // 2/3 = 66.67 -> 67
        let result = evaluate(&q, &answers(&[("q1", "q1-a"), ("q2", "q2-a")]));
        assert_eq!(result.score_percent, 67);
        assert_eq!(score_percent(1, 8), 13);
        assert_eq!(score_percent(1, 200), 1);
    }

    #[test]
    fn perfect_score() {
        let q = quiz("quiz", "c", &[5, 15], 60);
        let result = evaluate(&q, &answers(&[("q1", "q1-a"), ("q2", "q2-a")]));
        assert!(result.is_perfect());
    }
}
