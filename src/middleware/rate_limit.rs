/**
 * Rate Limiting
 *
 * Best-effort in-memory rate limiting for the authentication routes,
 * keyed by client IP plus the identifier being attempted. Counters use
 * a fixed window and live only in process memory; losing them on
 * restart is acceptable.
 *
 * Only failed attempts count against the window: handlers check before
 * the guarded operation and forgive the attempt once it succeeds, so
 * legitimate repeated use never exhausts the limit.
 */

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::AuthError;

struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window counter map for one route
pub struct RateLimiter {
    max: u32,
    window: Duration,
    message: String,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration, message: impl Into<String>) -> Self {
        Self {
            max,
            window,
            message: message.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Count one attempt for `key`, failing once the window is full
    pub fn check(&self, key: &str) -> Result<(), AuthError> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        // Occasional sweep so abandoned keys do not accumulate forever.
        if entries.len() > 1024 {
            entries.retain(|_, entry| now <= entry.reset_at);
        }

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            reset_at: now + self.window,
        });

        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }

        entry.count += 1;
        if entry.count > self.max {
            tracing::warn!(key, "rate limit exceeded");
            return Err(AuthError::rate_limited(&self.message));
        }

        Ok(())
    }

    /// Uncount one attempt for `key` after the guarded operation succeeds
    pub fn forgive(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(entry) = entries.get_mut(key) {
            entry.count = entry.count.saturating_sub(1);
        }
    }
}

/// Per-route limiters carried in the application state
pub struct RateLimits {
    pub login: RateLimiter,
    pub register: RateLimiter,
    pub forgot_password: RateLimiter,
    pub resend_verification: RateLimiter,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            login: RateLimiter::new(
                5,
                Duration::from_secs(5 * 60),
                "Too many failed login attempts. Please try again in 5 minutes",
            ),
            register: RateLimiter::new(
                3,
                Duration::from_secs(60 * 60),
                "Too many registration attempts. Please try again in 1 hour",
            ),
            forgot_password: RateLimiter::new(
                3,
                Duration::from_secs(60 * 60),
                "Too many password reset requests. Please try again in 1 hour",
            ),
            resend_verification: RateLimiter::new(
                5,
                Duration::from_secs(60 * 60),
                "Too many verification requests. Please try again in 1 hour",
            ),
        }
    }
}

/// Rate-limit key combining client IP and attempted identifier
pub fn limit_key(ip: &str, identifier: &str) -> String {
    format!("{ip}:{identifier}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_allows_up_to_max() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60), "slow down");
        for _ in 0..3 {
            assert!(limiter.check("1.2.3.4:alice").is_ok());
        }
        assert_matches!(
            limiter.check("1.2.3.4:alice"),
            Err(AuthError::RateLimited { .. })
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), "slow down");
        assert!(limiter.check("1.2.3.4:alice").is_ok());
        assert!(limiter.check("5.6.7.8:alice").is_ok());
        assert!(limiter.check("1.2.3.4:bob").is_ok());
        assert!(limiter.check("1.2.3.4:alice").is_err());
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20), "slow down");
        assert!(limiter.check("key").is_ok());
        assert!(limiter.check("key").is_err());

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("key").is_ok());
    }

    #[test]
    fn test_forgiven_attempts_do_not_count() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), "slow down");

        // Check-then-forgive on success: the window never fills.
        for _ in 0..10 {
            limiter.check("1.2.3.4:alice").expect("forgiven attempts must not throttle");
            limiter.forgive("1.2.3.4:alice");
        }

        // Failures still count.
        assert!(limiter.check("1.2.3.4:alice").is_ok());
        assert!(limiter.check("1.2.3.4:alice").is_ok());
        assert!(limiter.check("1.2.3.4:alice").is_err());
    }

    #[test]
    fn test_forgive_unknown_key_is_noop() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), "slow down");
        limiter.forgive("never-seen");
        assert!(limiter.check("never-seen").is_ok());
        assert!(limiter.check("never-seen").is_err());
    }

    #[test]
    fn test_limit_key_format() {
        assert_eq!(limit_key("1.2.3.4", "alice"), "1.2.3.4:alice");
    }
}
