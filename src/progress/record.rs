//! Per-lesson progress records

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Administrative override of the normal unlock rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockOverride {
    /// Reachable even if the previous lesson is incomplete
    Unlocked,
    /// Unreachable even if the previous lesson is complete
    Locked,
}

/// Progress for a single (course, lesson) pair
///
/// Serialized with camelCase keys so stored blobs stay readable by the
/// browser front end that shares the key-value store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Furthest playback position credited (video lessons)
    #[serde(default)]
    pub watched_seconds: f64,

    /// Best quiz score (quiz lessons, 0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_percent: Option<u32>,

    /// Has the lesson been completed?
    #[serde(default)]
    pub is_completed: bool,

    /// Completed by an explicit mark rather than watching or passing
    #[serde(default)]
    pub manually_completed: bool,

    /// Administrative unlock override, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_override: Option<UnlockOverride>,

    /// Unix timestamp of the first completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,

    /// Unix timestamp of the last mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

impl ProgressRecord {
    /// Credit a playback position, never moving backwards
    pub fn observe_position(&mut self, position_seconds: f64) -> f64 {
        if position_seconds.is_finite() && position_seconds > self.watched_seconds {
            self.watched_seconds = position_seconds;
        }
        self.watched_seconds
    }

    /// Keep the better of the stored and the new quiz score
    pub fn observe_score(&mut self, score_percent: u32) -> u32 {
        let best = self.score_percent.map_or(score_percent, |s| s.max(score_percent));
        self.score_percent = Some(best);
        best
    }

    /// Mark completed, returning true if this is a new completion
    pub fn complete(&mut self, now: i64) -> bool {
        if self.is_completed {
            return false;
        }
        self.is_completed = true;
        self.completed_at.get_or_insert(now);
        true
    }

    pub fn is_force_unlocked(&self) -> bool {
        self.unlock_override == Some(UnlockOverride::Unlocked)
    }

    pub fn is_force_locked(&self) -> bool {
        self.unlock_override == Some(UnlockOverride::Locked)
    }

    /// Has the learner touched this lesson at all?
    pub fn is_started(&self) -> bool {
        self.is_completed || self.watched_seconds > 0.0 || self.score_percent.is_some()
    }

    pub fn touch(&mut self, now: i64) {
        self.last_updated = Some(now);
    }
}

/// Current Unix time in seconds
pub fn unix_now() -> i64 {
    SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).map_or(0, |d| d.as_secs() as i64)
}
