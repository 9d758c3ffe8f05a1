//! Guarding of external lookups.
//!
//! The [`ResourceGovernor`] owns one rate limiter, one set of circuit breakers
//! and one result cache for the whole engine. Analyzers never call a remote
//! collaborator directly; they go through [`ResourceGovernor::guarded_call`],
//! which consults the cache, the breaker and the limiter before running the
//! call under a timeout.
//!
//! Governor state lives behind `std::sync` locks that are never held across
//! an `.await`.

mod cache;
mod circuit_breaker;
mod rate_limit;
mod sanitize;

pub use cache::{CacheResult, CacheStats, ResultCache, PURGE_INTERVAL};
pub use circuit_breaker::{BreakerStatus, CircuitBreaker, CircuitBreakerManager, CircuitState};
pub use rate_limit::{RateLimit, RateLimiter};
pub use sanitize::{
    sanitize_text, validate_doi, validate_input, FieldRule, InputError, InputKind, InputSchema,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;

use crate::config::GovernorConfig;
use crate::models::IssueCode;
use crate::sources::SourceError;

/// Outcome of a guarded external call
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalOutcome<T> {
    /// The call (or the cache) produced an answer
    Resolved(T),
    /// The source's quota for this window is spent
    RateLimited,
    /// The source's circuit is open
    CircuitOpen,
    /// The call did not finish within the timeout
    TimedOut,
    /// The call returned an error
    Failed(String),
}

impl<T> ExternalOutcome<T> {
    /// Whether the lookup gave no usable answer without the source being at fault
    pub fn is_inconclusive(&self) -> bool {
        matches!(
            self,
            ExternalOutcome::RateLimited | ExternalOutcome::CircuitOpen | ExternalOutcome::TimedOut
        )
    }

    /// Issue code describing an inconclusive outcome
    pub fn issue_code(&self) -> Option<IssueCode> {
        match self {
            ExternalOutcome::RateLimited => Some(IssueCode::RateLimitExceeded),
            ExternalOutcome::CircuitOpen => Some(IssueCode::CircuitOpen),
            ExternalOutcome::TimedOut => Some(IssueCode::LookupTimeout),
            ExternalOutcome::Resolved(_) | ExternalOutcome::Failed(_) => None,
        }
    }

    /// Short label for messages
    pub fn label(&self) -> &'static str {
        match self {
            ExternalOutcome::Resolved(_) => "resolved",
            ExternalOutcome::RateLimited => "rate limited",
            ExternalOutcome::CircuitOpen => "circuit open",
            ExternalOutcome::TimedOut => "timed out",
            ExternalOutcome::Failed(_) => "failed",
        }
    }
}

/// Diagnostic snapshot of the governor
#[derive(Debug, Clone, Serialize)]
pub struct GovernorStatus {
    pub breakers: Vec<BreakerStatus>,
    pub rate_limits: Vec<RateLimitStatus>,
    pub cache: CacheStats,
}

/// Rate limit window as reported in a status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub source: String,
    pub quota: u32,
    pub used: u32,
    pub window_secs: u64,
}

/// Rate limiter, circuit breakers and cache for external calls
#[derive(Debug)]
pub struct ResourceGovernor {
    limiter: RateLimiter,
    breakers: CircuitBreakerManager,
    cache: ResultCache,
    call_timeout: Duration,
}

impl Default for ResourceGovernor {
    fn default() -> Self {
        Self::new(&GovernorConfig::default())
    }
}

impl ResourceGovernor {
    pub fn new(config: &GovernorConfig) -> Self {
        let limits = config.clone();
        Self {
            limiter: RateLimiter::with_limits(move |source| {
                let (quota, window) = limits.limit_for(source);
                (quota, Duration::from_secs(window))
            }),
            breakers: CircuitBreakerManager::new(
                config.failure_threshold,
                Duration::from_secs(config.cooldown_secs),
            ),
            cache: ResultCache::new(Duration::from_secs(config.cache_ttl_secs)),
            call_timeout: Duration::from_millis(config.call_timeout_ms),
        }
    }

    /// Admit one call to `source` if its window has quota left
    pub fn check_rate_limit(&self, source: &str) -> bool {
        self.limiter.check(source)
    }

    /// Whether `source`'s circuit lets a call through
    pub fn check_circuit_breaker(&self, source: &str) -> bool {
        self.breakers.get(source).check()
    }

    /// Feed a call's outcome to `source`'s breaker
    pub fn record_api_result(&self, source: &str, success: bool) {
        let breaker = self.breakers.get(source);
        if success {
            breaker.record_success();
        } else {
            breaker.record_failure();
        }
    }

    /// Return the cached value for `key`, or compute, store and return it
    ///
    /// Errors are not cached. Concurrent misses on the same key each run `f`.
    pub async fn with_cache<T, E, F, Fut>(&self, key: &str, ttl: Duration, f: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let CacheResult::Hit(value) = self.cache.get::<T>(key) {
            return Ok(value);
        }

        let value = f().await?;
        self.cache.put(key, &value, ttl);
        Ok(value)
    }

    /// Check `args` against `schema`
    pub fn validate_input(
        &self,
        schema: &InputSchema,
        args: &Value,
    ) -> Result<Map<String, Value>, Vec<InputError>> {
        validate_input(schema, args)
    }

    /// Run an external call under cache, breaker, rate limit and timeout
    pub async fn guarded_call<T, F, Fut>(&self, source: &str, cache_key: &str, f: F) -> ExternalOutcome<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        if let CacheResult::Hit(value) = self.cache.get::<T>(cache_key) {
            return ExternalOutcome::Resolved(value);
        }

        if !self.check_circuit_breaker(source) {
            tracing::debug!("[governor] {}: skipping call, circuit open", source);
            return ExternalOutcome::CircuitOpen;
        }

        if !self.check_rate_limit(source) {
            tracing::debug!("[governor] {}: skipping call, rate limited", source);
            return ExternalOutcome::RateLimited;
        }

        match tokio::time::timeout(self.call_timeout, f()).await {
            Ok(Ok(value)) => {
                self.record_api_result(source, true);
                self.cache.put(cache_key, &value, self.cache.default_ttl());
                ExternalOutcome::Resolved(value)
            }
            Ok(Err(e)) => {
                tracing::warn!("[governor] {}: call failed: {}", source, e);
                self.record_api_result(source, false);
                ExternalOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    "[governor] {}: call timed out after {}ms",
                    source,
                    self.call_timeout.as_millis()
                );
                ExternalOutcome::TimedOut
            }
        }
    }

    /// Snapshot of breakers, rate limit windows and cache counters
    pub fn status(&self) -> GovernorStatus {
        let mut rate_limits: Vec<_> = self
            .limiter
            .status()
            .into_iter()
            .map(|(source, limit)| RateLimitStatus {
                source,
                quota: limit.quota,
                used: limit.used,
                window_secs: limit.window.as_secs(),
            })
            .collect();
        rate_limits.sort_by(|a, b| a.source.cmp(&b.source));

        GovernorStatus {
            breakers: self.breakers.status(),
            rate_limits,
            cache: self.cache.stats(),
        }
    }

    /// Forget breaker, limiter and cache state
    pub fn reset(&self) {
        self.breakers.reset_all();
        self.limiter.reset_all();
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceLimitConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> GovernorConfig {
        GovernorConfig {
            default_quota: 3,
            default_window_secs: 60,
            failure_threshold: 5,
            cooldown_secs: 60,
            call_timeout_ms: 100,
            ..GovernorConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_through_governor() {
        let governor = ResourceGovernor::new(&config());
        assert!(governor.check_rate_limit("doi"));
        assert!(governor.check_rate_limit("doi"));
        assert!(governor.check_rate_limit("doi"));
        assert!(!governor.check_rate_limit("doi"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(governor.check_rate_limit("doi"));
    }

    #[tokio::test]
    async fn test_per_source_limit_override() {
        let mut config = config();
        config.source_limits.push(SourceLimitConfig {
            source: "crossref".to_string(),
            quota: 1,
            window_secs: 60,
        });
        let governor = ResourceGovernor::new(&config);

        assert!(governor.check_rate_limit("crossref"));
        assert!(!governor.check_rate_limit("crossref"));
        assert!(governor.check_rate_limit("doi"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_through_governor() {
        let governor = ResourceGovernor::new(&config());
        for _ in 0..5 {
            governor.record_api_result("doi", false);
        }
        assert!(!governor.check_circuit_breaker("doi"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(governor.check_circuit_breaker("doi"));

        governor.record_api_result("doi", true);
        assert_eq!(governor.status().breakers[0].state, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_cache_computes_once_until_expiry() {
        let governor = ResourceGovernor::new(&config());
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u32, SourceError> = governor
                .with_cache("answer", Duration::from_secs(10), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(value.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(11)).await;
        let _: Result<u32, SourceError> = governor
            .with_cache("answer", Duration::from_secs(10), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_cache_does_not_store_errors() {
        let governor = ResourceGovernor::new(&config());

        let first: Result<u32, &str> = governor
            .with_cache("k", Duration::from_secs(10), || async { Err("boom") })
            .await;
        assert!(first.is_err());

        let second: Result<u32, &str> = governor
            .with_cache("k", Duration::from_secs(10), || async { Ok(7) })
            .await;
        assert_eq!(second.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_guarded_call_resolves_and_caches() {
        let governor = ResourceGovernor::new(&config());
        let calls = AtomicUsize::new(0);

        for _ in 0..5 {
            let outcome = governor
                .guarded_call("doi", "doi:10.1000/1", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<bool, SourceError>(true)
                })
                .await;
            assert_eq!(outcome, ExternalOutcome::Resolved(true));
        }

        // Cache hits do not consume quota
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(governor.status().rate_limits[0].used, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_call_cache_stays_bounded() {
        let governor = ResourceGovernor::new(&GovernorConfig {
            default_quota: 1000,
            cache_ttl_secs: 1,
            ..config()
        });

        for i in 0..1000 {
            let outcome = governor
                .guarded_call("doi", &format!("doi:10.1000/{}", i), || async {
                    Ok::<bool, SourceError>(true)
                })
                .await;
            assert_eq!(outcome, ExternalOutcome::Resolved(true));
            tokio::time::advance(Duration::from_secs(2)).await;
        }

        assert!(governor.status().cache.entries <= PURGE_INTERVAL as usize);
    }

    #[tokio::test]
    async fn test_guarded_call_rate_limited() {
        let governor = ResourceGovernor::new(&config());

        for i in 0..3 {
            let outcome = governor
                .guarded_call("doi", &format!("doi:{}", i), || async { Ok::<bool, SourceError>(true) })
                .await;
            assert!(matches!(outcome, ExternalOutcome::Resolved(true)));
        }

        let outcome = governor
            .guarded_call("doi", "doi:new", || async { Ok::<bool, SourceError>(true) })
            .await;
        assert_eq!(outcome, ExternalOutcome::RateLimited);
        assert!(outcome.is_inconclusive());
        assert_eq!(outcome.issue_code(), Some(IssueCode::RateLimitExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_call_opens_circuit_after_failures() {
        let mut config = config();
        config.default_quota = 100;
        let governor = ResourceGovernor::new(&config);

        for i in 0..5 {
            let outcome = governor
                .guarded_call("crossref", &format!("k{}", i), || async {
                    Err::<bool, _>(SourceError::Network("down".to_string()))
                })
                .await;
            assert!(matches!(outcome, ExternalOutcome::Failed(_)));
        }

        let outcome = governor
            .guarded_call("crossref", "k-next", || async { Ok::<bool, SourceError>(true) })
            .await;
        assert_eq!(outcome, ExternalOutcome::CircuitOpen);

        tokio::time::advance(Duration::from_secs(60)).await;
        let outcome = governor
            .guarded_call("crossref", "k-next", || async { Ok::<bool, SourceError>(true) })
            .await;
        assert_eq!(outcome, ExternalOutcome::Resolved(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_call_timeout_is_inconclusive() {
        let governor = ResourceGovernor::new(&config());

        let outcome = governor
            .guarded_call("doi", "slow", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<bool, SourceError>(true)
            })
            .await;

        assert_eq!(outcome, ExternalOutcome::TimedOut);
        assert!(outcome.is_inconclusive());
        // Timeouts do not count against the breaker
        assert_eq!(governor.status().breakers[0].failures, 0);
    }

    #[test]
    fn test_validate_input_through_governor() {
        let governor = ResourceGovernor::default();
        let schema = InputSchema::new().field(FieldRule::string("check_id").required());

        assert!(governor
            .validate_input(&schema, &serde_json::json!({"check_id": "abc"}))
            .is_ok());
        assert!(governor
            .validate_input(&schema, &serde_json::json!({}))
            .is_err());
    }
}
