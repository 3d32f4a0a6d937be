//! Request pacing for polite API use.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum delay between consecutive requests.
pub struct RateLimiter {
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: Mutex::new(None),
        }
    }

    /// Limiter allowing at most `per_second` requests each second.
    pub fn per_second(per_second: u64) -> Self {
        Self::new(Duration::from_millis(1000 / per_second.max(1)))
    }

    /// Wait until the next request is allowed. The first call returns
    /// immediately.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_second_delay() {
        let limiter = RateLimiter::per_second(20);
        assert_eq!(limiter.min_delay, Duration::from_millis(50));

        let limiter = RateLimiter::per_second(0);
        assert_eq!(limiter.min_delay, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_wait_enforces_delay() {
        let limiter = RateLimiter::new(Duration::from_millis(40));

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_first_wait_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(60));

        let start = Instant::now();
        limiter.wait().await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
