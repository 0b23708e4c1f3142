use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use super::session::QuizSession;
use crate::Clock;

/// A session shared between the answer loop and its timer.
pub type SharedQuizSession = Arc<Mutex<QuizSession>>;

#[must_use]
pub fn shared(session: QuizSession) -> SharedQuizSession {
    Arc::new(Mutex::new(session))
}

/// Background task feeding one-second ticks into a session.
///
/// The task stops by itself once the session completes. Dropping the handle
/// cancels it.
#[derive(Debug)]
pub struct SessionTimer {
    handle: Option<JoinHandle<()>>,
}

impl SessionTimer {
    /// Spawn the ticking task on the current tokio runtime.
    ///
    /// The lock is only held while a tick is applied, never across an `.await`.
    #[must_use]
    pub fn spawn(session: SharedQuizSession, period: Duration, clock: Clock) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let done = match session.lock() {
                    Ok(mut guard) => {
                        guard.tick(clock.now());
                        guard.is_completed()
                    }
                    Err(err) => {
                        warn!(error = %err, "session lock poisoned; stopping timer");
                        true
                    }
                };
                if done {
                    debug!("session timer stopped");
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// One tick per second.
    #[must_use]
    pub fn spawn_per_second(session: SharedQuizSession, clock: Clock) -> Self {
        Self::spawn(session, Duration::from_secs(1), clock)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait until the task has stopped on its own.
    pub async fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Stop ticking now.
    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
