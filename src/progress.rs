//! Cosmetic upload progress. The percentage cycles on a timer while a request
//! is in flight and does not track bytes sent.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Next percentage: `step` up to 100, then back to 0.
pub fn advance(percent: u8, step: u8) -> u8 {
    if percent >= 100 {
        0
    } else {
        percent.saturating_add(step).min(100)
    }
}

/// Periodic task bumping the shared percentage. Dropping it stops the task and
/// resets the percentage to 0.
pub struct ProgressTicker {
    progress: Arc<watch::Sender<u8>>,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Must be called from within a tokio runtime.
    pub fn start(progress: Arc<watch::Sender<u8>>, period: Duration, step: u8) -> Self {
        progress.send_replace(0);

        let ticking = Arc::clone(&progress);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                ticking.send_modify(|p| *p = advance(*p, step));
            }
        });

        Self { progress, handle }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
        self.progress.send_replace(0);
    }
}
