//! Cancellable periodic ticker driving a racing segment.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// One tick from the ticker with the given generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// A running ticker. Dropping or cancelling it stops the task; cancelling consumes the handle so
/// a ticker is torn down at most once.
#[derive(Debug)]
pub struct Ticker {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a task that sends `wrap(Tick)` every `period`, starting one period from now.
    ///
    /// The task exits on its own when the receiving side is closed.
    pub fn spawn<T, F>(period: Duration, generation: u64, tx: mpsc::Sender<T>, wrap: F) -> Self
    where
        T: Send + 'static,
        F: Fn(Tick) -> T + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(wrap(Tick { generation })).await.is_err() {
                    break;
                }
            }
        });
        debug!(generation, period_ms = period.as_millis() as u64, "ticker started");
        Self { generation, handle }
    }

    /// Whether `tick` was produced by this ticker.
    pub fn owns(&self, tick: Tick) -> bool {
        tick.generation == self.generation
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(generation = self.generation, "ticker stopped");
    }
}
