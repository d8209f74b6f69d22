use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::controller::QuizEvent;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Autonomous one-second tick source for an active session.
///
/// Sends `QuizEvent::Tick` tagged with its generation so events queued by a
/// ticker that has since been replaced can be told apart. The task is aborted
/// on `stop` and on drop.
#[derive(Debug)]
pub struct SessionTicker {
    generation: u64,
    handle: JoinHandle<()>,
}

impl SessionTicker {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(period: Duration, generation: u64, events: UnboundedSender<QuizEvent>) -> Self {
        let period = period.max(MIN_PERIOD);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if events.send(QuizEvent::Tick { generation }).is_err() {
                    break;
                }
            }
        });
        tracing::trace!(generation, "session ticker started");
        Self { generation, handle }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stop(self) {
        tracing::trace!(generation = self.generation, "session ticker stopped");
    }
}

impl Drop for SessionTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
