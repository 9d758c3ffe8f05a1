//! Running checks in the background and tracking their state.
//!
//! [`ValidationOrchestrator::submit`] stores a pending check and returns its id
//! at once; a spawned task moves it to running, evaluates every rule of the
//! snapshot in its own task, and finally completes or fails the check. Rules
//! that error, panic or exceed the rule timeout get a synthetic failed result
//! and never affect their siblings. A panic anywhere else in the run fails the
//! whole check.

use futures_util::future::join_all;
use futures_util::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::aggregator::{ReportAggregator, WeightedResult};
use super::observer::{EventBus, IntegrityEvent};
use super::IntegrityError;
use crate::models::{
    CheckStatus, CheckType, Document, IntegrityCheck, IntegrityReport, IssueCode, IssueType,
    Severity, ValidationContext, ValidationIssue, ValidationResult,
};
use crate::rules::{RuleRegistry, ValidationRule};

#[derive(Debug, Default)]
struct StoreInner {
    checks: HashMap<String, IntegrityCheck>,
    /// Terminal check ids, oldest first
    finished: VecDeque<String>,
}

/// In-memory store of checks with bounded retention of finished ones
#[derive(Debug)]
pub struct CheckStore {
    inner: Mutex<StoreInner>,
    max_retained: usize,
}

impl CheckStore {
    pub fn new(max_retained: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            max_retained: max_retained.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, check: IntegrityCheck) {
        self.lock().checks.insert(check.id.clone(), check);
    }

    /// Copy of the current state of a check
    pub fn get(&self, id: &str) -> Option<IntegrityCheck> {
        self.lock().checks.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move a check to `next`, applying `update` in the same critical section
    pub fn transition(
        &self,
        id: &str,
        next: CheckStatus,
        update: impl FnOnce(&mut IntegrityCheck),
    ) -> Result<(), IntegrityError> {
        let mut inner = self.lock();
        let check = inner
            .checks
            .get_mut(id)
            .ok_or_else(|| IntegrityError::CheckNotFound(id.to_string()))?;

        if !check.status.can_transition_to(next) {
            return Err(IntegrityError::InvalidTransition {
                from: check.status,
                to: next,
            });
        }

        check.status = next;
        check.updated_at = chrono::Utc::now();
        update(check);

        if next.is_terminal() {
            inner.finished.push_back(id.to_string());
            while inner.finished.len() > self.max_retained {
                if let Some(oldest) = inner.finished.pop_front() {
                    inner.checks.remove(&oldest);
                    tracing::debug!("Evicted finished check {}", oldest);
                }
            }
        }
        Ok(())
    }
}

fn failure_issue(description: String) -> ValidationIssue {
    ValidationIssue::new(
        IssueType::LogicalError,
        IssueCode::RuleExecutionError,
        Severity::Critical,
        description,
    )
}

#[derive(Debug)]
struct Inner {
    rules: Arc<RuleRegistry>,
    store: CheckStore,
    events: EventBus,
    aggregator: ReportAggregator,
    rule_timeout: Duration,
}

/// Drives checks through `pending -> running -> completed | failed`
#[derive(Debug, Clone)]
pub struct ValidationOrchestrator {
    inner: Arc<Inner>,
}

impl ValidationOrchestrator {
    pub fn new(
        rules: Arc<RuleRegistry>,
        aggregator: ReportAggregator,
        rule_timeout: Duration,
        max_retained_checks: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                rules,
                store: CheckStore::new(max_retained_checks),
                events: EventBus::new(256),
                aggregator,
                rule_timeout,
            }),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn store(&self) -> &CheckStore {
        &self.inner.store
    }

    /// Store a pending check and start it in the background
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, document: Document, context: ValidationContext, check_type: CheckType) -> String {
        let check_id = uuid::Uuid::new_v4().to_string();
        let check = IntegrityCheck::new(&check_id, &context.document_id, check_type);
        self.inner.store.insert(check);

        self.inner.events.emit(IntegrityEvent::CheckSubmitted {
            check_id: check_id.clone(),
            document_id: context.document_id.clone(),
            check_type,
        });

        let inner = Arc::clone(&self.inner);
        let id = check_id.clone();
        tokio::spawn(async move {
            let run = inner.run(&id, Arc::new(document), Arc::new(context), check_type);
            inner.supervise(&id, run).await;
        });

        check_id
    }

    /// Wait until a check reaches a terminal state
    pub async fn wait_for(&self, check_id: &str) -> Result<IntegrityCheck, IntegrityError> {
        let mut events = self.inner.events.subscribe();

        loop {
            let check = self
                .inner
                .store
                .get(check_id)
                .ok_or_else(|| IntegrityError::CheckNotFound(check_id.to_string()))?;
            if check.status.is_terminal() {
                return Ok(check);
            }

            match events.recv().await {
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("Event subscriber lagged by {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    return self
                        .inner
                        .store
                        .get(check_id)
                        .ok_or_else(|| IntegrityError::CheckNotFound(check_id.to_string()));
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl Inner {
    /// Drive `run` to the end, failing the check if it panics
    async fn supervise(&self, check_id: &str, run: impl Future<Output = ()>) {
        if let Err(payload) = AssertUnwindSafe(run).catch_unwind().await {
            let message = panic_message(payload.as_ref());
            tracing::error!("Check {} panicked: {}", check_id, message);
            self.fail(check_id, format!("check task panicked: {}", message));
        }
    }

    async fn run(
        &self,
        check_id: &str,
        document: Arc<Document>,
        context: Arc<ValidationContext>,
        check_type: CheckType,
    ) {
        let started = Instant::now();

        if let Err(problems) = context.validate() {
            self.fail(check_id, format!("invalid context: {}", problems.join("; ")));
            return;
        }

        let rules = self.rules.snapshot(check_type);
        if rules.is_empty() {
            self.fail(check_id, IntegrityError::NoEnabledRules.to_string());
            return;
        }

        let rule_ids: Vec<String> = rules.iter().map(|r| r.id.clone()).collect();
        let algorithms: Vec<String> = rules.iter().map(|r| r.algorithm().to_string()).collect();
        let ids = rule_ids.clone();
        if let Err(e) = self.store.transition(check_id, CheckStatus::Running, move |check| {
            check.metadata.rules_run = ids;
            check.metadata.algorithms_used = algorithms;
        }) {
            tracing::warn!("Check {} could not start: {}", check_id, e);
            return;
        }
        self.events.emit(IntegrityEvent::CheckStarted {
            check_id: check_id.to_string(),
            rules: rule_ids,
        });

        let results = self.evaluate_all(&rules, document, context.clone()).await;
        for w in &results {
            self.events.emit(IntegrityEvent::RuleCompleted {
                check_id: check_id.to_string(),
                rule_id: w.result.rule_id.clone(),
                score: w.result.score,
                passed: w.result.passed,
            });
        }

        let elapsed = started.elapsed().as_millis() as u64;
        let report = self.aggregator.aggregate(results, &context, elapsed);
        self.complete(check_id, report, elapsed);
    }

    async fn evaluate_all(
        &self,
        rules: &[ValidationRule],
        document: Arc<Document>,
        context: Arc<ValidationContext>,
    ) -> Vec<WeightedResult> {
        let handles: Vec<_> = rules
            .iter()
            .map(|rule| {
                let rule = rule.clone();
                let document = Arc::clone(&document);
                let context = Arc::clone(&context);
                let timeout = self.rule_timeout;

                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, rule.evaluate(&document, &context)).await {
                        Ok(Ok(result)) => result,
                        Ok(Err(e)) => {
                            tracing::warn!("Rule {} failed: {}", rule.id, e);
                            ValidationResult::failed(&rule.id, rule.category, &e.to_string())
                        }
                        Err(_) => {
                            tracing::warn!("Rule {} timed out after {:?}", rule.id, timeout);
                            ValidationResult::failed(
                                &rule.id,
                                rule.category,
                                &format!("timed out after {}s", timeout.as_secs()),
                            )
                        }
                    }
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(rules)
            .map(|(joined, rule)| {
                let mut result = joined.unwrap_or_else(|e| {
                    tracing::warn!("Rule {} panicked: {}", rule.id, e);
                    ValidationResult::failed(&rule.id, rule.category, "rule task panicked")
                });
                crate::analyzers::assign_issue_ids(&rule.id, &mut result.issues);
                WeightedResult {
                    result,
                    weight: rule.weight,
                }
            })
            .collect()
    }

    fn complete(&self, check_id: &str, report: IntegrityReport, elapsed: u64) {
        let overall_score = report.overall_score;
        let passed = report.passed;

        match self.store.transition(check_id, CheckStatus::Completed, move |check| {
            check.metadata.processing_time_ms = elapsed;
            check.report = Some(report);
        }) {
            Ok(()) => self.events.emit(IntegrityEvent::CheckCompleted {
                check_id: check_id.to_string(),
                overall_score,
                passed,
            }),
            Err(e) => tracing::warn!("Check {} could not complete: {}", check_id, e),
        }
    }

    fn fail(&self, check_id: &str, reason: String) {
        let issue = failure_issue(format!("Check failed: {}", reason));

        match self.store.transition(check_id, CheckStatus::Failed, move |check| {
            check.issues.push(issue);
        }) {
            Ok(()) => self.events.emit(IntegrityEvent::CheckFailed {
                check_id: check_id.to_string(),
                reason,
            }),
            Err(e) => tracing::warn!("Check {} could not be marked failed: {}", check_id, e),
        }
    }
}
