//! Per-source windowed rate limiting.
//!
//! Each source gets a window that is created lazily on first use. A window
//! admits `quota` calls; once `now` passes `reset_at` the counter starts over.
//! All windows live behind one mutex, so check-and-increment is atomic for
//! concurrent callers probing the same source.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Rate limit state for one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Calls allowed per window
    pub quota: u32,

    /// Window length
    pub window: Duration,

    /// Calls admitted in the current window
    pub used: u32,

    /// When the current window ends
    pub reset_at: Instant,
}

impl RateLimit {
    fn new(quota: u32, window: Duration, now: Instant) -> Self {
        Self {
            quota,
            window,
            used: 0,
            reset_at: now + window,
        }
    }

    /// Calls still available in the current window
    pub fn remaining(&self) -> u32 {
        self.quota.saturating_sub(self.used)
    }
}

type LimitFn = Box<dyn Fn(&str) -> (u32, Duration) + Send + Sync>;

/// Rate limiter keyed by external source name
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateLimit>>,
    limits: LimitFn,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("windows", &self.windows)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Create a limiter applying the same quota and window to every source
    pub fn new(quota: u32, window: Duration) -> Self {
        Self::with_limits(move |_| (quota, window))
    }

    /// Create a limiter that looks up quota and window per source
    pub fn with_limits<F>(limits: F) -> Self
    where
        F: Fn(&str) -> (u32, Duration) + Send + Sync + 'static,
    {
        Self {
            windows: Mutex::new(HashMap::new()),
            limits: Box::new(limits),
        }
    }

    /// Try to admit one call for `source`
    ///
    /// Returns `false` without touching the counter when the quota for the
    /// current window is used up.
    pub fn check(&self, source: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let window = windows.entry(source.to_string()).or_insert_with(|| {
            let (quota, length) = (self.limits)(source);
            RateLimit::new(quota, length, now)
        });

        if now > window.reset_at {
            window.used = 0;
            window.reset_at = now + window.window;
        }

        if window.used >= window.quota {
            tracing::debug!(
                "[rate-limit] {}: quota of {} exhausted until window reset",
                source,
                window.quota
            );
            return false;
        }

        window.used += 1;
        true
    }

    /// Current state for a source, if it has been used
    pub fn get(&self, source: &str) -> Option<RateLimit> {
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows.get(source).copied()
    }

    /// Snapshot of every known window
    pub fn status(&self) -> Vec<(String, RateLimit)> {
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Forget all windows
    pub fn reset_all(&self) {
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_quota_then_reset_after_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check("doi"));
        assert!(limiter.check("doi"));
        assert!(limiter.check("doi"));
        assert!(!limiter.check("doi"));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!limiter.check("doi"));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(limiter.check("doi"));
        assert_eq!(limiter.get("doi").unwrap().used, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_leaves_state_untouched() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("doi"));

        let before = limiter.get("doi").unwrap();
        assert!(!limiter.check("doi"));
        assert_eq!(limiter.get("doi").unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sources_are_independent() {
        let limiter = RateLimiter::with_limits(|source| match source {
            "crossref" => (1, Duration::from_secs(10)),
            _ => (2, Duration::from_secs(10)),
        });

        assert!(limiter.check("crossref"));
        assert!(!limiter.check("crossref"));
        assert!(limiter.check("doi"));
        assert!(limiter.check("doi"));
        assert!(!limiter.check("doi"));
        assert_eq!(limiter.status().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_never_exceed_quota() {
        let limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(3600)));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.check("doi") })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 10);
    }
}
