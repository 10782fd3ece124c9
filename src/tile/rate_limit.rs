use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;

/// Default pause after each network fetch.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(1);

/// Fixed-interval pause applied after every remote tile fetch.
///
/// This is not a token bucket: cache hits never touch the limiter, and each
/// miss waits the full interval after its request completes. Callers sharing
/// one limiter through an `Arc` are serialized, so concurrent fetch paths
/// still issue at most one request per interval.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    gate: Mutex<()>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            gate: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait out the interval, holding the gate so other callers queue behind.
    pub async fn pause(&self) {
        if self.interval.is_zero() {
            return;
        }
        let _guard = self.gate.lock().await;
        sleep(self.interval).await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT)
    }
}
