//! Minimum-interval rate limiting shared by both fetch modes.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep_until};
use tracing::trace;

/// Enforces a minimum spacing between outbound requests.
///
/// [`acquire`](RateLimiter::acquire) blocks until at least `min_interval` has
/// elapsed since the previous grant, then records the new grant time. The
/// grant timestamp sits behind an async mutex that is held across the wait,
/// so when several workers call in concurrently the grants themselves are
/// serialized and spaced: this is the single synchronization point keeping
/// the remote service safe from burst traffic no matter how wide the pool is.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// A zero `min_interval` disables throttling entirely.
    pub fn new(min_interval: Duration) -> Self {
        RateLimiter {
            min_interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Wait for the next request slot.
    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last_grant.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            let now = Instant::now();
            if now < ready_at {
                trace!(wait_ms = (ready_at - now).as_millis() as u64, "throttling request");
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
