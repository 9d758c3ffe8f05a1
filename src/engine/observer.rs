//! Check lifecycle events and the observers that receive them.

use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::models::CheckType;

/// Something that happened to a check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IntegrityEvent {
    CheckSubmitted {
        check_id: String,
        document_id: String,
        check_type: CheckType,
    },
    CheckStarted {
        check_id: String,
        rules: Vec<String>,
    },
    RuleCompleted {
        check_id: String,
        rule_id: String,
        score: f64,
        passed: bool,
    },
    CheckCompleted {
        check_id: String,
        overall_score: f64,
        passed: bool,
    },
    CheckFailed {
        check_id: String,
        reason: String,
    },
}

impl IntegrityEvent {
    /// Check the event belongs to
    pub fn check_id(&self) -> &str {
        match self {
            IntegrityEvent::CheckSubmitted { check_id, .. }
            | IntegrityEvent::CheckStarted { check_id, .. }
            | IntegrityEvent::RuleCompleted { check_id, .. }
            | IntegrityEvent::CheckCompleted { check_id, .. }
            | IntegrityEvent::CheckFailed { check_id, .. } => check_id,
        }
    }

    /// Whether the event ends its check
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IntegrityEvent::CheckCompleted { .. } | IntegrityEvent::CheckFailed { .. }
        )
    }
}

/// Receives check lifecycle events
///
/// Called synchronously from the task driving the check, so implementations
/// should return quickly.
pub trait IntegrityObserver: Send + Sync {
    fn on_event(&self, event: &IntegrityEvent);
}

/// Observer writing events to the `tracing` subscriber
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IntegrityObserver for TracingObserver {
    fn on_event(&self, event: &IntegrityEvent) {
        match event {
            IntegrityEvent::CheckSubmitted {
                check_id,
                document_id,
                check_type,
            } => tracing::info!("Check {} submitted for {} ({:?})", check_id, document_id, check_type),
            IntegrityEvent::CheckStarted { check_id, rules } => {
                tracing::info!("Check {} running {} rules", check_id, rules.len())
            }
            IntegrityEvent::RuleCompleted {
                check_id,
                rule_id,
                score,
                ..
            } => tracing::debug!("Check {}: rule {} scored {:.1}", check_id, rule_id, score),
            IntegrityEvent::CheckCompleted {
                check_id,
                overall_score,
                passed,
            } => tracing::info!(
                "Check {} completed: {:.1} ({})",
                check_id,
                overall_score,
                if *passed { "passed" } else { "failed" }
            ),
            IntegrityEvent::CheckFailed { check_id, reason } => {
                tracing::warn!("Check {} failed: {}", check_id, reason)
            }
        }
    }
}

/// Fans events out to observers and broadcast subscribers
pub struct EventBus {
    observers: RwLock<Vec<Arc<dyn IntegrityObserver>>>,
    sender: broadcast::Sender<IntegrityEvent>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            observers: RwLock::new(Vec::new()),
            sender,
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn IntegrityObserver>) {
        self.observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<IntegrityEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: IntegrityEvent) {
        let observers = self.observers.read().unwrap_or_else(|e| e.into_inner()).clone();
        for observer in &observers {
            observer.on_event(&event);
        }
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}
