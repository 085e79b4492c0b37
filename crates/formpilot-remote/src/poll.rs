//! Fixed-interval polling with a hard deadline.

use std::time::Duration;

use tokio::time::Instant;

/// Repeats a probe every `interval` until `timeout` has elapsed.
///
/// The deadline is fixed at construction, so a slow probe eats into the
/// remaining budget instead of extending it.
pub(crate) struct Poller {
    interval: Duration,
    deadline: Instant,
}

impl Poller {
    pub(crate) fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            deadline: Instant::now() + timeout,
        }
    }

    pub(crate) fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub(crate) async fn wait(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_poller_expires_after_timeout() {
        let poller = Poller::new(Duration::from_millis(300), Duration::from_secs(1));
        assert!(!poller.expired());

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!poller.expired());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(poller.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_one_interval() {
        let poller = Poller::new(Duration::from_millis(300), Duration::from_secs(10));
        let before = Instant::now();
        poller.wait().await;
        assert_eq!(Instant::now() - before, Duration::from_millis(300));
    }
}
