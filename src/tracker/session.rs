//! Per-tick decisions of a watch session

use serde::Serialize;

use super::playback::{PlaybackError, PlaybackState};
use crate::engine::WatchUpdate;

/// Why a tracking session ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StopReason {
    /// Stopped by the owner or replaced by a newer session
    Cancelled,
    Paused,
    Ended,
    /// A tick failed; the session stopped instead of retrying
    Failed(String),
}

/// What a tick should do
#[derive(Debug, Clone, PartialEq)]
pub enum TickAction {
    /// Credit the position and keep sampling
    Record(f64),
    /// Credit the final position, then stop (playback ended)
    RecordAndStop(f64, StopReason),
    Stop(StopReason),
}

/// Final state of a tracking session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingSummary {
    pub course_id: String,
    pub lesson_id: String,
    /// Positions credited to the lesson
    pub ticks: u32,
    pub watched_seconds: f64,
    pub percent: f64,
    /// The lesson was completed during this session
    pub completed: bool,
    pub reason: StopReason,
}

/// State of one lesson's tracking session
#[derive(Debug, Clone)]
pub struct WatchSession {
    course_id: String,
    lesson_id: String,
    ticks: u32,
    last_update: Option<WatchUpdate>,
    completed: bool,
    stopped: Option<StopReason>,
}

impl WatchSession {
    pub fn new(course_id: impl Into<String>, lesson_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            lesson_id: lesson_id.into(),
            ticks: 0,
            last_update: None,
            completed: false,
            stopped: None,
        }
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }

    /// Decide what to do with one sample of the player
    pub fn decide(
        &self,
        state: PlaybackState,
        position: Result<f64, PlaybackError>,
    ) -> TickAction {
        match (state, position) {
            (_, Err(e)) => TickAction::Stop(StopReason::Failed(e.to_string())),
            (PlaybackState::Playing, Ok(p)) => TickAction::Record(p),
            (PlaybackState::Paused, Ok(_)) => TickAction::Stop(StopReason::Paused),
            (PlaybackState::Ended, Ok(p)) => TickAction::RecordAndStop(p, StopReason::Ended),
        }
    }

    /// Fold in the engine's answer to a credited position
    ///
    /// Returns true the first time this session sees the lesson complete.
    pub fn apply(&mut self, update: WatchUpdate) -> bool {
        self.ticks += 1;
        let first = update.just_completed && !self.completed;
        self.completed |= update.just_completed;
        self.last_update = Some(update);
        first
    }

    /// Record why the session ended; the first reason wins
    pub fn stop(&mut self, reason: StopReason) {
        self.stopped.get_or_insert(reason);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.is_some()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn last_update(&self) -> Option<&WatchUpdate> {
        self.last_update.as_ref()
    }

    pub fn into_summary(self) -> TrackingSummary {
        let (watched_seconds, percent) =
            self.last_update.as_ref().map_or((0.0, 0.0), |u| (u.watched_seconds, u.percent));
        TrackingSummary {
            course_id: self.course_id,
            lesson_id: self.lesson_id,
            ticks: self.ticks,
            watched_seconds,
            percent,
            completed: self.completed,
            reason: self.stopped.unwrap_or(StopReason::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn update(watched: f64, just_completed: bool) -> WatchUpdate {
        WatchUpdate {
            lesson_id: "l".into(),
            watched_seconds: watched,
            percent: watched,
            completed: just_completed,
            just_completed,
        }
    }

    #[test]
    fn decisions_follow_player_state() {
        let session = WatchSession::new("c", "l");
        assert_eq!(session.decide(PlaybackState::Playing, Ok(5.0)), TickAction::Record(5.0));
        assert_eq!(
            session.decide(PlaybackState::Paused, Ok(5.0)),
            TickAction::Stop(StopReason::Paused)
        );
        assert_eq!(
            session.decide(PlaybackState::Ended, Ok(60.0)),
            TickAction::RecordAndStop(60.0, StopReason::Ended)
        );
        assert_eq!(
            session.decide(PlaybackState::Playing, Err(PlaybackError::Detached)),
            TickAction::Stop(StopReason::Failed("Player detached".into()))
        );
    }

    #[test]
    fn completion_is_reported_once() {
        let mut session = WatchSession::new("c", "l");
        assert!(!session.apply(update(10.0, false)));
        assert!(session.apply(update(100.0, true)));
        assert!(!session.apply(update(100.0, false)));

        session.stop(StopReason::Ended);
        session.stop(StopReason::Cancelled);
        let summary = session.into_summary();
        assert_eq!(summary.ticks, 3);
        assert!(summary.completed);
        assert_eq!(summary.reason, StopReason::Ended);
        assert_eq!(summary.watched_seconds, 100.0);
    }

    #[test]
    fn unstopped_session_reports_cancelled() {
        let summary = WatchSession::new("c", "l").into_summary();
        assert_eq!(summary.reason, StopReason::Cancelled);
        assert_eq!(summary.ticks, 0);
    }
}
