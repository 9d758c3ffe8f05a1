//! Circuit breaker for external lookups.
//!
//! The breaker stops the engine from hammering a source that keeps failing.
//! It has three states:
//!
//! - **Closed**: normal operation, calls pass through
//! - **Open**: the source is failing, calls are rejected until the cooldown passes
//! - **Half-Open**: the cooldown passed; the next call probes the source
//!
//! A success in any state closes the circuit. A failure in half-open
//! re-opens it straight away.
//!
//! # Usage
//!
//! ```rust
//! use research_integrity::governor::{CircuitBreaker, CircuitState};
//!
//! let breaker = CircuitBreaker::new("doi", 5, std::time::Duration::from_secs(60));
//!
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - calls pass through
    Closed,
    /// Failing - calls are rejected
    Open,
    /// Cooldown elapsed - next call is a probe
    HalfOpen,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
}

/// Thread-safe circuit breaker for one source
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Source name (e.g., "doi", "crossref")
    name: String,

    /// Failures before opening the circuit
    failure_threshold: u32,

    /// Time to stay open before probing
    cooldown: Duration,

    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    ///
    /// - `name`: identifier for this circuit (e.g., "doi")
    /// - `failure_threshold`: consecutive failures before opening
    /// - `cooldown`: time to stay open before half-open
    pub fn new(name: &str, failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            name: name.to_string(),
            failure_threshold: failure_threshold.max(1),
            cooldown,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                last_failure: None,
            }),
        }
    }

    /// Create with default settings (5 failures, 60s cooldown)
    pub fn default_for(name: &str) -> Self {
        Self::new(name, 5, Duration::from_secs(60))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state, without applying the cooldown transition
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Consecutive failures recorded since the last success
    pub fn failures(&self) -> u32 {
        self.lock().failures
    }

    /// Decide whether a call may go out
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open here and
    /// admits the call.
    pub fn check(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled = inner
                    .last_failure
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if cooled {
                    inner.state = CircuitState::HalfOpen;
                    tracing::info!("[circuit-breaker] {}: circuit half-open (probing)", self.name);
                }
                cooled
            }
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!("[circuit-breaker] {}: circuit closed (recovered)", self.name);
        }
        inner.state = CircuitState::Closed;
        inner.failures = 0;
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failures += 1;
        inner.last_failure = Some(Instant::now());

        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                tracing::warn!(
                    "[circuit-breaker] {}: circuit reopened (failure in half-open)",
                    self.name
                );
            }
            CircuitState::Closed if inner.failures >= self.failure_threshold => {
                inner.state = CircuitState::Open;
                tracing::warn!(
                    "[circuit-breaker] {}: circuit opened ({} failures)",
                    self.name,
                    inner.failures
                );
            }
            _ => {}
        }
    }

    /// Reset the circuit breaker to closed state
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.last_failure = None;
    }
}

/// Snapshot of one breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerStatus {
    pub source: String,
    pub state: CircuitState,
    pub failures: u32,
}

/// Manager for multiple circuit breakers (one per source)
#[derive(Debug)]
pub struct CircuitBreakerManager {
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

impl CircuitBreakerManager {
    /// Create a manager whose breakers share one threshold and cooldown
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            breakers: RwLock::new(HashMap::new()),
            failure_threshold,
            cooldown,
        }
    }

    /// Get or create a circuit breaker for a source
    pub fn get(&self, source: &str) -> Arc<CircuitBreaker> {
        {
            let read_guard = self.breakers.read().unwrap_or_else(|e| e.into_inner());
            if let Some(breaker) = read_guard.get(source) {
                return Arc::clone(breaker);
            }
        }

        let mut write_guard = self.breakers.write().unwrap_or_else(|e| e.into_inner());
        // Another caller may have inserted it while we waited for the write lock
        if let Some(breaker) = write_guard.get(source) {
            return Arc::clone(breaker);
        }

        let breaker = Arc::new(CircuitBreaker::new(
            source,
            self.failure_threshold,
            self.cooldown,
        ));
        write_guard.insert(source.to_string(), Arc::clone(&breaker));
        breaker
    }

    /// Reset all circuit breakers
    pub fn reset_all(&self) {
        let guard = self.breakers.read().unwrap_or_else(|e| e.into_inner());
        for breaker in guard.values() {
            breaker.reset();
        }
    }

    /// Get status of all circuit breakers, sorted by source
    pub fn status(&self) -> Vec<BreakerStatus> {
        let guard = self.breakers.read().unwrap_or_else(|e| e.into_inner());
        let mut status: Vec<_> = guard
            .iter()
            .map(|(name, breaker)| BreakerStatus {
                source: name.clone(),
                state: breaker.state(),
                failures: breaker.failures(),
            })
            .collect();
        status.sort_by(|a, b| a.source.cmp(&b.source));
        status
    }
}
