use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Enforces a minimum interval between outgoing API requests
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_second: u64) -> Self {
        let delay = Duration::from_millis(1000 / requests_per_second.max(1));
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// Wait if necessary to respect rate limit
    pub async fn wait(&self) {
        let wait_time = {
            let last = self.last_request.lock().await;
            last.and_then(|last_time| self.delay.checked_sub(last_time.elapsed()))
        };

        if let Some(wait) = wait_time {
            debug!("Rate limiting: waiting {:?}", wait);
            sleep(wait).await;
        }

        let mut last = self.last_request.lock().await;
        *last = Some(Instant::now());
    }
}
