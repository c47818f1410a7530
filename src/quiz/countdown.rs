//! Single-shot countdown for timed quizzes
//!
//! One countdown covers a whole attempt. It is started once and can only be
//! cancelled, never restarted; a retry creates a new countdown.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A running countdown that fires a callback on expiry
#[derive(Debug)]
pub struct QuizCountdown {
    cancel_token: CancellationToken,
    deadline: Instant,
    handle: Option<JoinHandle<bool>>,
}

impl QuizCountdown {
    /// Start counting down; `on_expire` runs if the limit elapses uncancelled
    pub fn start<F, Fut>(limit: Duration, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let deadline = Instant::now() + limit;
        let token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => false,
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::info!("Quiz time limit reached, auto-submitting");
                    on_expire().await;
                    true
                }
            }
        });

        Self { cancel_token, deadline, handle: Some(handle) }
    }

    /// Time left before expiry
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Stop the countdown without firing
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Whether the countdown task has ended (expired or cancelled)
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Wait for the countdown to end, returning true if it expired
    pub async fn join(mut self) -> bool {
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(false),
            None => false,
        }
    }
}

impl Drop for QuizCountdown {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
