use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_size: Duration,
    pub max_attempts: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // Two login attempts per ten seconds per client
        Self {
            window_size: Duration::seconds(10),
            max_attempts: 2,
        }
    }
}

#[derive(Debug)]
struct AttemptWindow {
    timestamps: Vec<DateTime<Utc>>,
}

impl AttemptWindow {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
        }
    }

    fn cleanup_old_attempts(&mut self, window_size: Duration) {
        let cutoff = Utc::now() - window_size;
        self.timestamps.retain(|ts| *ts > cutoff);
    }

    fn add_attempt(&mut self) {
        self.timestamps.push(Utc::now());
    }

    fn attempt_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Sliding-window limiter for login attempts, keyed by the caller's
/// client identity (peer IP at the HTTP boundary). Attempts are recorded
/// under a write lock so concurrent requests cannot exceed the threshold.
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, AttemptWindow>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Records the attempt and returns whether it is within the window
    /// limit. Denied attempts are not recorded.
    pub async fn allow(&self, client_key: &str) -> bool {
        let mut windows = self.windows.write().await;

        let window = windows
            .entry(client_key.to_string())
            .or_insert_with(AttemptWindow::new);

        window.cleanup_old_attempts(self.config.window_size);

        if window.attempt_count() < self.config.max_attempts as usize {
            window.add_attempt();
            true
        } else {
            false
        }
    }

    /// Drops windows with no attempts inside the current window.
    pub async fn cleanup(&self) {
        let mut windows = self.windows.write().await;

        windows.retain(|_, window| {
            window.cleanup_old_attempts(self.config.window_size);
            !window.timestamps.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration as TokioDuration};

    #[tokio::test]
    async fn test_rate_limiter_threshold() {
        let limiter = RateLimiter::new(RateLimitConfig::default());

        // Two attempts allowed, third denied within the window
        assert!(limiter.allow("10.0.0.1").await);
        assert!(limiter.allow("10.0.0.1").await);
        assert!(!limiter.allow("10.0.0.1").await);

        // Independent client key is unaffected
        assert!(limiter.allow("10.0.0.2").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_window_expiry() {
        let config = RateLimitConfig {
            window_size: Duration::seconds(1),
            max_attempts: 2,
        };
        let limiter = RateLimiter::new(config);

        assert!(limiter.allow("10.0.0.1").await);
        assert!(limiter.allow("10.0.0.1").await);
        assert!(!limiter.allow("10.0.0.1").await);

        // Wait for window to pass
        sleep(TokioDuration::from_millis(1100)).await;

        assert!(limiter.allow("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_windows() {
        let config = RateLimitConfig {
            window_size: Duration::seconds(1),
            max_attempts: 2,
        };
        let limiter = RateLimiter::new(config);

        assert!(limiter.allow("10.0.0.1").await);
        sleep(TokioDuration::from_millis(1100)).await;
        limiter.cleanup().await;

        assert!(limiter.windows.read().await.is_empty());
    }
}
