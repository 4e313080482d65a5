//! Minimum-interval limiter for backend searches.
//!
//! The ed2k search servers ban clients that search too often, so every
//! backend search in the process goes through one limiter.

use std::future::Future;

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Serializes calls and keeps at least `min_interval` between the end of one
/// call and the start of the next.
pub struct MinIntervalLimiter {
    min_interval: Duration,
    /// Completion time of the last call. Held locked for the whole call.
    last_completed: Mutex<Option<Instant>>,
}

/// Records the completion time when dropped, so failed or cancelled calls
/// still count.
struct CompletionGuard<'a> {
    slot: &'a mut Option<Instant>,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        *self.slot = Some(Instant::now());
    }
}

impl MinIntervalLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_completed: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time left before another call may start, if any.
    pub async fn remaining(&self) -> Option<Duration> {
        let last = *self.last_completed.lock().await;
        self.wait_after(last)
    }

    fn wait_after(&self, last: Option<Instant>) -> Option<Duration> {
        let elapsed = last?.elapsed();
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }

    /// Wait for the interval to pass, then run `call`.
    pub async fn run<F, Fut, T>(&self, call: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last = self.last_completed.lock().await;

        if let Some(wait) = self.wait_after(*last) {
            debug!(wait_ms = wait.as_millis() as u64, "Rate limiting backend search");
            sleep(wait).await;
        }

        let _guard = CompletionGuard { slot: &mut *last };
        call().await
    }
}
