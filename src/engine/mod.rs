//! Course progress engine
//!
//! Ties the progress store, unlock resolver and XP ledger together. Every
//! mutation persists the record and then recomputes course completion and
//! the learner's level before returning, so derived state never lags the
//! store.

pub mod error;
pub mod events;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::course::{Catalog, Lesson};
use crate::ledger::{
    self, Badge, CourseRecords, CourseSummary, LearnerStats, LevelTable, Milestone,
    ProgressSnapshot, UserLevelState, achievements,
};
use crate::progress::{
    LessonStatus, ProgressRecord, ProgressStore, StorageBackend, unix_now, unlock,
};
use crate::quiz::{QuizResult, evaluate};

pub use error::EngineError;
pub use events::{EngineEvent, ProgressListener};

/// Engine shared between the owner and background timers
pub type SharedEngine<B> = Arc<Mutex<CourseEngine<B>>>;

/// Result of crediting a playback position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchUpdate {
    pub lesson_id: String,
    /// Furthest position credited, in seconds
    pub watched_seconds: f64,
    /// Watched percentage (0-100)
    pub percent: f64,
    pub completed: bool,
    /// This update completed the lesson
    pub just_completed: bool,
}

/// Result of submitting a quiz
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizOutcome {
    pub quiz_id: String,
    pub lesson_id: String,
    pub result: QuizResult,
    /// Best score across all attempts
    pub best_score: u32,
    /// Quiz XP reported for a passing attempt, 0 otherwise
    pub xp_awarded: u32,
    /// This submission completed the lesson
    pub lesson_completed: bool,
    /// Lesson opened by this submission
    pub unlocked_next: Option<String>,
}

/// Watched percentage of a lesson, 0 for lessons without a duration
pub fn watch_percent(watched_seconds: f64, duration_seconds: f64) -> f64 {
    if duration_seconds > 0.0 {
        (watched_seconds / duration_seconds * 100.0).min(100.0)
    } else {
        0.0
    }
}

/// The course progress state machine
pub struct CourseEngine<B> {
    catalog: Catalog,
    store: ProgressStore<B>,
    levels: LevelTable,
    completion_threshold: f64,
    listener: Option<Box<dyn ProgressListener>>,
    /// Level last reported, used to detect level-ups
    current_level: u32,
}

impl<B: StorageBackend> CourseEngine<B> {
    /// Create an engine over a catalog and a storage backend
    pub fn new(catalog: Catalog, backend: B) -> Self {
        let mut engine = Self {
            catalog,
            store: ProgressStore::new(backend),
            levels: LevelTable::default(),
            completion_threshold: Config::default().completion_threshold,
            listener: None,
            current_level: 0,
        };
        engine.current_level = engine.level_state().level.level;
        engine
    }

    /// Create an engine using the configured thresholds
    pub fn from_config(config: &Config, catalog: Catalog, backend: B) -> Self {
        Self::new(catalog, backend).with_threshold(config.completion_threshold)
    }

    pub fn with_threshold(mut self, completion_threshold: f64) -> Self {
        self.completion_threshold = completion_threshold;
        self
    }

    pub fn with_levels(mut self, levels: LevelTable) -> Self {
        self.levels = levels;
        self.current_level = self.level_state().level.level;
        self
    }

    pub fn with_listener(mut self, listener: impl ProgressListener + 'static) -> Self {
        self.set_listener(listener);
        self
    }

    pub fn set_listener(&mut self, listener: impl ProgressListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Wrap the engine for use by background timers
    pub fn into_shared(self) -> SharedEngine<B> {
        Arc::new(Mutex::new(self))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ProgressStore<B> {
        &self.store
    }

    pub fn level_table(&self) -> &LevelTable {
        &self.levels
    }

    pub fn completion_threshold(&self) -> f64 {
        self.completion_threshold
    }

    // Reads

    /// Stored record for a lesson, or a fresh one
    pub fn record(&self, course_id: &str, lesson_id: &str) -> Result<ProgressRecord, EngineError> {
        self.catalog.lesson(course_id, lesson_id)?;
        Ok(self.store.get_or_default(course_id, lesson_id))
    }

    pub fn course_records(&self, course_id: &str) -> Result<CourseRecords, EngineError> {
        Ok(self.store.records_for(self.catalog.course(course_id)?))
    }

    /// Records of every course in the catalog
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.catalog
            .courses
            .iter()
            .map(|c| (c.id.clone(), self.store.records_for(c)))
            .collect::<HashMap<_, _>>()
    }

    /// Reachable lesson ids, in position order
    pub fn unlocked_lessons(&self, course_id: &str) -> Result<Vec<String>, EngineError> {
        let course = self.catalog.course(course_id)?;
        Ok(unlock::unlocked_lessons(course, &self.store.records_for(course)))
    }

    pub fn is_unlocked(&self, course_id: &str, lesson_id: &str) -> Result<bool, EngineError> {
        self.catalog.lesson(course_id, lesson_id)?;
        Ok(self.unlocked_lessons(course_id)?.iter().any(|id| id == lesson_id))
    }

    pub fn lesson_statuses(
        &self,
        course_id: &str,
    ) -> Result<Vec<(String, LessonStatus)>, EngineError> {
        let course = self.catalog.course(course_id)?;
        Ok(unlock::lesson_statuses(course, &self.store.records_for(course)))
    }

    pub fn course_summary(&self, course_id: &str) -> Result<CourseSummary, EngineError> {
        let course = self.catalog.course(course_id)?;
        let records = self.store.records_for(course);
        Ok(CourseSummary::new(course, &records, self.store.completion_date(course_id)))
    }

    pub fn is_certificate_eligible(&self, course_id: &str) -> Result<bool, EngineError> {
        Ok(self.course_summary(course_id)?.is_certificate_eligible())
    }

    pub fn total_xp(&self) -> u64 {
        ledger::total_xp(&self.catalog.courses, &self.snapshot())
    }

    pub fn level_state(&self) -> UserLevelState {
        UserLevelState::compute(&self.levels, self.total_xp())
    }

    pub fn learner_stats(&self) -> LearnerStats {
        let at_top = self.levels.level_for(self.total_xp()).level == self.levels.top().level;
        LearnerStats::collect(&self.catalog.courses, &self.snapshot(), at_top)
    }

    pub fn badges(&self) -> Vec<Badge> {
        achievements::badges(&self.learner_stats())
    }

    pub fn milestones(&self) -> Vec<Milestone> {
        achievements::milestones(&self.learner_stats())
    }

    // Learner actions

    /// Look up a lesson and check it is reachable
    pub fn accessible_lesson(&self, course_id: &str, lesson_id: &str) -> Result<Lesson, EngineError> {
        let course = self.catalog.course(course_id)?;
        let lesson = course
            .lesson(lesson_id)
            .ok_or_else(|| EngineError::lesson_not_found(course_id, lesson_id))?;
        if !unlock::is_unlocked(course, &self.store.records_for(course), lesson_id) {
            return Err(EngineError::locked(course_id, lesson_id));
        }
        Ok(lesson.clone())
    }

    /// Look up a reachable video lesson
    ///
    /// Readings and quizzes are never completed by playback.
    pub fn accessible_video(&self, course_id: &str, lesson_id: &str) -> Result<Lesson, EngineError> {
        let lesson = self.accessible_lesson(course_id, lesson_id)?;
        if !lesson.is_video() {
            return Err(EngineError::not_a_video(course_id, lesson_id));
        }
        Ok(lesson)
    }

    /// Credit a playback position to a video lesson
    ///
    /// Watch time never decreases. Crossing the completion threshold snaps
    /// the watched time to the full duration and completes the lesson once.
    pub fn record_watch(
        &mut self,
        course_id: &str,
        lesson_id: &str,
        position_seconds: f64,
    ) -> Result<WatchUpdate, EngineError> {
        let lesson = self.accessible_video(course_id, lesson_id)?;
        let duration = lesson.duration_seconds();
        let now = unix_now();

        let mut record = self.store.get_or_default(course_id, lesson_id);
        let observed = if duration > 0.0 && position_seconds.is_finite() {
            position_seconds.min(duration)
        } else {
            position_seconds
        };
        record.observe_position(observed);

        let mut just_completed = false;
        if !record.is_completed
            && duration > 0.0
            && record.watched_seconds >= duration * self.completion_threshold
        {
            record.watched_seconds = duration;
            just_completed = record.complete(now);
            tracing::info!("Lesson {}/{} watched to completion", course_id, lesson_id);
        }
        record.touch(now);

        let update = WatchUpdate {
            lesson_id: lesson_id.to_string(),
            watched_seconds: record.watched_seconds,
            percent: watch_percent(record.watched_seconds, duration),
            completed: record.is_completed,
            just_completed,
        };
        self.store.put(course_id, lesson_id, record)?;

        self.notify(|l| l.on_progress_update(update.percent, lesson_id));
        if just_completed {
            self.notify(|l| l.on_lesson_complete(lesson_id));
        }
        self.after_change(course_id)?;
        Ok(update)
    }

    /// Mark a reachable lesson completed (e.g. a reading)
    pub fn complete_lesson(&mut self, course_id: &str, lesson_id: &str) -> Result<bool, EngineError> {
        self.accessible_lesson(course_id, lesson_id)?;
        self.mark_complete(course_id, lesson_id)
    }

    /// Score a quiz lesson and record the result
    ///
    /// A failing attempt stores the score but leaves the lesson incomplete.
    pub fn submit_quiz(
        &mut self,
        course_id: &str,
        lesson_id: &str,
        answers: &HashMap<String, String>,
    ) -> Result<QuizOutcome, EngineError> {
        let quiz = self.catalog.quiz_for_lesson(course_id, lesson_id)?.clone();
        self.accessible_lesson(course_id, lesson_id)?;
        let now = unix_now();

        let result = evaluate(&quiz, answers);
        let mut record = self.store.get_or_default(course_id, lesson_id);
        let best_score = record.observe_score(result.score_percent);
        let lesson_completed = result.passed && record.complete(now);
        record.touch(now);
        self.store.put(course_id, lesson_id, record)?;

        tracing::info!(
            "Quiz {} scored {}% ({}), best {}%",
            quiz.id,
            result.score_percent,
            if result.passed { "passed" } else { "failed" },
            best_score
        );

        self.notify(|l| l.on_quiz_complete(result.passed, &quiz.id, result.score_percent));
        if lesson_completed {
            self.notify(|l| l.on_lesson_complete(lesson_id));
        }
        self.after_change(course_id)?;

        let mut unlocked_next = None;
        if lesson_completed {
            let next = self.catalog.course(course_id)?.next_lesson(lesson_id).map(|l| l.id.clone());
            if let Some(id) = next {
                if self.is_unlocked(course_id, &id)? {
                    unlocked_next = Some(id);
                }
            }
        }

        Ok(QuizOutcome {
            quiz_id: quiz.id.clone(),
            lesson_id: lesson_id.to_string(),
            xp_awarded: if result.passed { quiz.xp } else { 0 },
            result,
            best_score,
            lesson_completed,
            unlocked_next,
        })
    }

    // Administrative overrides

    /// Open a lesson regardless of its predecessor
    pub fn force_unlock(&mut self, course_id: &str, lesson_id: &str) -> Result<(), EngineError> {
        self.catalog.lesson(course_id, lesson_id)?;
        let mut record = self.store.get_or_default(course_id, lesson_id);
        unlock::force_unlock(&mut record);
        record.touch(unix_now());
        self.store.put(course_id, lesson_id, record)?;
        tracing::info!("Force-unlocked {}/{}", course_id, lesson_id);
        self.after_change(course_id)
    }

    /// Lock a lesson and clear its completion
    pub fn force_lock(&mut self, course_id: &str, lesson_id: &str) -> Result<(), EngineError> {
        self.catalog.lesson(course_id, lesson_id)?;
        let mut record = self.store.get_or_default(course_id, lesson_id);
        unlock::force_lock(&mut record);
        record.touch(unix_now());
        self.store.replace(course_id, lesson_id, record)?;
        tracing::info!("Force-locked {}/{}", course_id, lesson_id);
        self.after_change(course_id)
    }

    /// Complete a lesson without any gating
    pub fn mark_complete(&mut self, course_id: &str, lesson_id: &str) -> Result<bool, EngineError> {
        self.catalog.lesson(course_id, lesson_id)?;
        let now = unix_now();
        let mut record = self.store.get_or_default(course_id, lesson_id);
        let newly = unlock::mark_complete(&mut record, now);
        record.touch(now);
        self.store.put(course_id, lesson_id, record)?;

        if newly {
            tracing::info!("Marked {}/{} complete", course_id, lesson_id);
            self.notify(|l| l.on_lesson_complete(lesson_id));
        }
        self.after_change(course_id)?;
        Ok(newly)
    }

    /// Delete a lesson's progress
    pub fn reset_lesson(&mut self, course_id: &str, lesson_id: &str) -> Result<bool, EngineError> {
        self.catalog.lesson(course_id, lesson_id)?;
        let existed = self.store.reset(course_id, lesson_id)?;
        if existed {
            tracing::info!("Reset progress for {}/{}", course_id, lesson_id);
        }
        self.after_change(course_id)?;
        Ok(existed)
    }

    /// Delete progress for every lesson of a course
    pub fn reset_course(&mut self, course_id: &str) -> Result<usize, EngineError> {
        self.catalog.course(course_id)?;
        let removed = self.store.reset_course(course_id)?;
        tracing::info!("Reset {} lesson records in course {}", removed, course_id);
        self.after_change(course_id)?;
        Ok(removed)
    }

    // Derived state

    /// Recompute course completion and level after a record changed
    fn after_change(&mut self, course_id: &str) -> Result<(), EngineError> {
        let complete = self.course_summary(course_id)?.is_complete();
        match (complete, self.store.completion_date(course_id)) {
            (true, None) => {
                self.store.set_completion_date(course_id, unix_now())?;
                tracing::info!("Course {} completed", course_id);
                self.notify(|l| l.on_course_complete(course_id));
            }
            (false, Some(_)) => {
                self.store.clear_completion_date(course_id)?;
                tracing::info!("Course {} no longer complete", course_id);
            }
            _ => {}
        }

        let level = self.levels.level_for(self.total_xp()).clone();
        if level.level > self.current_level {
            tracing::info!("Level up: {} ({})", level.level, level.name);
            self.notify(|l| l.on_level_up(&level));
        }
        self.current_level = level.level;
        Ok(())
    }

    fn notify(&mut self, f: impl FnOnce(&mut dyn ProgressListener)) {
        if let Some(listener) = self.listener.as_mut() {
            f(listener.as_mut());
        }
    }
}

impl<B> std::fmt::Debug for CourseEngine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseEngine")
            .field("courses", &self.catalog.courses.len())
            .field("completion_threshold", &self.completion_threshold)
            .field("current_level", &self.current_level)
            .finish()
    }
}
