//! Randomised pauses between launches and transactions

use rand::Rng;
use std::time::Duration;
use tracing::info;

/// Uniform random delay in `[min, max]` seconds, rounded to 10 ms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepPolicy {
    min_secs: f64,
    max_secs: f64,
}

impl SleepPolicy {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let min_secs = min_secs.max(0.0);
        Self {
            min_secs,
            max_secs: max_secs.max(min_secs),
        }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn draw(&self) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rand::thread_rng().gen_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_millis(((secs * 100.0).round() as u64) * 10)
    }

    pub async fn sleep(&self) {
        let delay = self.draw();
        if delay.is_zero() {
            return;
        }
        info!("[Sleep] Sleeping for {:.2} seconds", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}
