//! Periodic sampling of a player into the engine
//!
//! A `WatchTracker` owns at most one running session. Each session is a
//! spawned task that ticks on a fixed interval and stops on pause, end,
//! error or cancellation. Starting a new session cancels the previous one
//! and waits for it, so two sessions never credit positions at once.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::playback::PlaybackSource;
use super::session::{StopReason, TickAction, TrackingSummary, WatchSession};
use crate::engine::{EngineError, SharedEngine};
use crate::progress::StorageBackend;

struct ActiveSession {
    course_id: String,
    lesson_id: String,
    cancel_token: CancellationToken,
    handle: JoinHandle<TrackingSummary>,
}

/// Drives watch sessions against a shared engine
pub struct WatchTracker<B> {
    engine: SharedEngine<B>,
    interval: Duration,
    active: Option<ActiveSession>,
}

impl<B: StorageBackend + Send + 'static> WatchTracker<B> {
    pub fn new(engine: SharedEngine<B>, interval: Duration) -> Self {
        Self { engine, interval, active: None }
    }

    /// Start sampling `source` for a lesson
    ///
    /// Fails without touching the running session if the lesson is missing,
    /// locked or not a video, or the source cannot report a position.
    pub async fn start(
        &mut self,
        course_id: &str,
        lesson_id: &str,
        source: impl PlaybackSource,
    ) -> Result<(), EngineError> {
        self.engine.lock().await.accessible_video(course_id, lesson_id)?;
        source.position_seconds()?;

        if let Some(previous) = self.stop_and_wait().await {
            tracing::debug!("Replaced tracking of {} after {} ticks", previous.lesson_id, previous.ticks);
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_session(
            self.engine.clone(),
            WatchSession::new(course_id, lesson_id),
            source,
            self.interval,
            cancel_token.clone(),
        ));
        tracing::debug!("Tracking {}/{} every {:?}", course_id, lesson_id, self.interval);

        self.active = Some(ActiveSession {
            course_id: course_id.to_string(),
            lesson_id: lesson_id.to_string(),
            cancel_token,
            handle,
        });
        Ok(())
    }

    /// Whether a session is still sampling
    pub fn is_tracking(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.handle.is_finished())
    }

    /// Course and lesson of the current session
    pub fn current(&self) -> Option<(&str, &str)> {
        self.active.as_ref().map(|a| (a.course_id.as_str(), a.lesson_id.as_str()))
    }

    /// Cancel the current session without waiting for it
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel_token.cancel();
        }
    }

    /// Cancel the current session and collect its summary
    pub async fn stop_and_wait(&mut self) -> Option<TrackingSummary> {
        let active = self.active.take()?;
        active.cancel_token.cancel();
        active.handle.await.ok()
    }

    /// Wait for the current session to stop on its own
    ///
    /// Dropping the returned future leaves the session running.
    pub async fn finished(&mut self) -> Option<TrackingSummary> {
        let summary = (&mut self.active.as_mut()?.handle).await.ok();
        self.active = None;
        summary
    }
}

impl<B> Drop for WatchTracker<B> {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel_token.cancel();
        }
    }
}

async fn run_session<B, P>(
    engine: SharedEngine<B>,
    mut session: WatchSession,
    source: P,
    interval: Duration,
    cancel_token: CancellationToken,
) -> TrackingSummary
where
    B: StorageBackend + Send + 'static,
    P: PlaybackSource,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately
    ticker.tick().await;

    while !session.is_stopped() {
        tokio::select! {
            _ = cancel_token.cancelled() => session.stop(StopReason::Cancelled),
            _ = ticker.tick() => {
                let (position, stop_after) =
                    match session.decide(source.state(), source.position_seconds()) {
                        TickAction::Record(p) => (p, None),
                        TickAction::RecordAndStop(p, reason) => (p, Some(reason)),
                        TickAction::Stop(reason) => {
                            if let StopReason::Failed(e) = &reason {
                                tracing::error!("Player for {} failed, stopping: {}", session.lesson_id(), e);
                            }
                            session.stop(reason);
                            continue;
                        }
                    };

                let result = {
                    let mut engine = engine.lock().await;
                    if cancel_token.is_cancelled() {
                        None
                    } else {
                        Some(engine.record_watch(session.course_id(), session.lesson_id(), position))
                    }
                };

                match result {
                    None => session.stop(StopReason::Cancelled),
                    Some(Ok(update)) => {
                        tracing::debug!("Tick {}: {:.1}%", session.lesson_id(), update.percent);
                        session.apply(update);
                        if let Some(reason) = stop_after {
                            session.stop(reason);
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!("Recording {} failed, stopping: {}", session.lesson_id(), e);
                        session.stop(StopReason::Failed(e.to_string()));
                    }
                }
            }
        }
    }

    let summary = session.into_summary();
    tracing::debug!("Stopped tracking {} ({:?})", summary.lesson_id, summary.reason);
    summary
}
