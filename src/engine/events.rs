//! Outbound notifications to the presentation layer

use tokio::sync::mpsc;

use crate::ledger::Level;

/// State changes the engine reports
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Watch percentage of a video lesson changed
    ProgressUpdate { percent: f64, lesson_id: String },
    /// A lesson became completed
    LessonComplete { lesson_id: String },
    /// A quiz attempt was scored
    QuizComplete { passed: bool, quiz_id: String, score_percent: u32 },
    /// Total XP crossed into a higher level
    LevelUp { level: u32, name: String },
    /// Every lesson of a course is completed
    CourseComplete { course_id: String },
}

/// Receives engine notifications
///
/// All methods default to doing nothing so listeners only implement what
/// they render.
pub trait ProgressListener: Send {
    fn on_progress_update(&mut self, _percent: f64, _lesson_id: &str) {}

    fn on_lesson_complete(&mut self, _lesson_id: &str) {}

    fn on_quiz_complete(&mut self, _passed: bool, _quiz_id: &str, _score_percent: u32) {}

    fn on_level_up(&mut self, _level: &Level) {}

    fn on_course_complete(&mut self, _course_id: &str) {}
}

/// Forward every notification into a channel
impl ProgressListener for mpsc::UnboundedSender<EngineEvent> {
    fn on_progress_update(&mut self, percent: f64, lesson_id: &str) {
        let _ = self.send(EngineEvent::ProgressUpdate { percent, lesson_id: lesson_id.into() });
    }

    fn on_lesson_complete(&mut self, lesson_id: &str) {
        let _ = self.send(EngineEvent::LessonComplete { lesson_id: lesson_id.into() });
    }

    fn on_quiz_complete(&mut self, passed: bool, quiz_id: &str, score_percent: u32) {
        let _ = self.send(EngineEvent::QuizComplete {
            passed,
            quiz_id: quiz_id.into(),
            score_percent,
        });
    }

    fn on_level_up(&mut self, level: &Level) {
        let _ = self.send(EngineEvent::LevelUp { level: level.level, name: level.name.clone() });
    }

    fn on_course_complete(&mut self, course_id: &str) {
        let _ = self.send(EngineEvent::CourseComplete { course_id: course_id.into() });
    }
}

/// Create a listener and the receiving end of its channel
pub fn channel() -> (mpsc::UnboundedSender<EngineEvent>, mpsc::UnboundedReceiver<EngineEvent>) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LevelTable;

    #[test]
    fn channel_listener_forwards_events() {
        let (mut tx, mut rx) = channel();
        tx.on_lesson_complete("l1");
        tx.on_level_up(LevelTable::default().level_for(1000));

        assert_eq!(rx.try_recv().unwrap(), EngineEvent::LessonComplete { lesson_id: "l1".into() });
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::LevelUp { level: 2, name: "Knowledge Seeker".into() }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (mut tx, rx) = channel();
        drop(rx);
        tx.on_course_complete("c");
    }
}
