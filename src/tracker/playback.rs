//! Playback sources the watch tracker samples

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::time::Instant;

/// Player state as reported at a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Ended,
}

/// Errors raised while reading a player
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlaybackError {
    #[error("Playback position unavailable: {0}")]
    Unavailable(String),

    #[error("Player detached")]
    Detached,
}

/// Something that can report a playback position
pub trait PlaybackSource: Send + 'static {
    fn state(&self) -> PlaybackState;

    /// Current position in seconds
    fn position_seconds(&self) -> Result<f64, PlaybackError>;
}

#[derive(Debug)]
struct PlayerInner {
    duration_seconds: f64,
    speed: f64,
    state: PlaybackState,
    /// Position when playback last started or was seeked
    base_position: f64,
    resumed_at: Option<Instant>,
    detached: bool,
}

impl PlayerInner {
    fn position(&self) -> f64 {
        let elapsed = self.resumed_at.map_or(0.0, |at| at.elapsed().as_secs_f64() * self.speed);
        (self.base_position + elapsed).min(self.duration_seconds)
    }

    fn settle(&mut self) {
        self.base_position = self.position();
        self.resumed_at = None;
    }
}

/// A clock-driven player for the CLI and tests
///
/// Clones share the same playback. Position advances with tokio time, so
/// paused-clock tests move it deterministically.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    inner: Arc<Mutex<PlayerInner>>,
}

impl SimulatedPlayer {
    /// A paused player at position 0
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlayerInner {
                duration_seconds: duration_seconds.max(0.0),
                speed: 1.0,
                state: PlaybackState::Paused,
                base_position: 0.0,
                resumed_at: None,
                detached: false,
            })),
        }
    }

    /// Playback rate multiplier
    pub fn with_speed(self, speed: f64) -> Self {
        self.lock().speed = if speed > 0.0 { speed } else { 1.0 };
        self
    }

    fn lock(&self) -> MutexGuard<'_, PlayerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn play(&self) {
        let mut inner = self.lock();
        if inner.state != PlaybackState::Playing && !inner.detached {
            inner.settle();
            inner.state = PlaybackState::Playing;
            inner.resumed_at = Some(Instant::now());
        }
    }

    pub fn pause(&self) {
        let mut inner = self.lock();
        if inner.state == PlaybackState::Playing {
            inner.settle();
            inner.state = PlaybackState::Paused;
        }
    }

    /// Jump to a position, keeping the current state
    pub fn seek(&self, position_seconds: f64) {
        let mut inner = self.lock();
        inner.base_position = position_seconds.clamp(0.0, inner.duration_seconds);
        if inner.resumed_at.is_some() {
            inner.resumed_at = Some(Instant::now());
        }
    }

    /// Stop at the end of the video
    pub fn end(&self) {
        let mut inner = self.lock();
        inner.base_position = inner.duration_seconds;
        inner.resumed_at = None;
        inner.state = PlaybackState::Ended;
    }

    /// Make every later position read fail
    pub fn detach(&self) {
        self.lock().detached = true;
    }

    pub fn duration_seconds(&self) -> f64 {
        self.lock().duration_seconds
    }
}

impl PlaybackSource for SimulatedPlayer {
    fn state(&self) -> PlaybackState {
        let inner = self.lock();
        if inner.state == PlaybackState::Playing && inner.position() >= inner.duration_seconds {
            PlaybackState::Ended
        } else {
            inner.state
        }
    }

    fn position_seconds(&self) -> Result<f64, PlaybackError> {
        let inner = self.lock();
        if inner.detached {
            return Err(PlaybackError::Detached);
        }
        Ok(inner.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn position_follows_the_clock_while_playing() {
        let player = SimulatedPlayer::new(100.0);
        assert_eq!(player.state(), PlaybackState::Paused);

        player.play();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(player.position_seconds().unwrap(), 10.0);

        player.pause();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(player.position_seconds().unwrap(), 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_and_seek() {
        let player = SimulatedPlayer::new(100.0).with_speed(2.0);
        player.play();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(player.position_seconds().unwrap(), 10.0);

        player.seek(50.0);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(player.position_seconds().unwrap(), 52.0);
    }

    #[tokio::test(start_paused = true)]
    async fn playing_past_the_end_reports_ended() {
        let player = SimulatedPlayer::new(3.0);
        player.play();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(player.state(), PlaybackState::Ended);
        assert_eq!(player.position_seconds().unwrap(), 3.0);
    }

    #[test]
    fn detached_player_errors() {
        let player = SimulatedPlayer::new(10.0);
        let handle = player.clone();
        handle.detach();
        assert_eq!(player.position_seconds(), Err(PlaybackError::Detached));
    }
}
