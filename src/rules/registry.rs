//! Registry of validation rules.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{RuleInfo, ValidationRule};
use crate::analyzers::{
    CitationValidator, ConsistencyChecker, DataConsistencyChecker, FormatChecker,
    MethodologyChecker, PlagiarismDetector,
};
use crate::config::{Config, RuleOverride};
use crate::governor::ResourceGovernor;
use crate::models::{CheckType, Severity};
use crate::sources::SourceRegistry;

/// Registry of every rule the engine knows about
///
/// Rules are never removed; they are only enabled, disabled or re-weighted.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: RwLock<HashMap<String, ValidationRule>>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in rules, with config overrides applied
    pub fn with_defaults(config: &Config, sources: SourceRegistry, governor: Arc<ResourceGovernor>) -> Self {
        let penalties = config.scoring.penalties;
        let registry = Self::new();

        registry.register(ValidationRule::new(
            Arc::new(PlagiarismDetector::new(
                config.plagiarism,
                sources.clone(),
                Arc::clone(&governor),
            )),
            Severity::Critical,
            0.30,
        ));
        registry.register(ValidationRule::new(
            Arc::new(CitationValidator::new(penalties, sources, governor)),
            Severity::Major,
            0.25,
        ));
        registry.register(ValidationRule::new(
            Arc::new(DataConsistencyChecker::new(penalties)),
            Severity::Major,
            0.20,
        ));
        registry.register(ValidationRule::new(
            Arc::new(MethodologyChecker::new()),
            Severity::Minor,
            0.10,
        ));
        registry.register(ValidationRule::new(
            Arc::new(ConsistencyChecker::new(penalties)),
            Severity::Major,
            0.10,
        ));
        registry.register(ValidationRule::new(
            Arc::new(FormatChecker::new(config.format, penalties)),
            Severity::Minor,
            0.05,
        ));

        registry.apply_overrides(&config.rules);
        registry
    }

    /// Add a rule, replacing any rule with the same id
    pub fn register(&self, rule: ValidationRule) {
        tracing::debug!("Registered rule {} (weight {})", rule.id, rule.weight);
        self.write().insert(rule.id.clone(), rule);
    }

    /// Apply enable/weight overrides; unknown ids are skipped
    pub fn apply_overrides(&self, overrides: &[RuleOverride]) {
        let mut rules = self.write();
        for o in overrides {
            let Some(rule) = rules.get_mut(&o.id) else {
                tracing::warn!("Ignoring override for unknown rule '{}'", o.id);
                continue;
            };
            if let Some(enabled) = o.enabled {
                rule.enabled = enabled;
            }
            if let Some(weight) = o.weight {
                rule.weight = weight.clamp(0.0, 1.0);
            }
        }
    }

    /// Enable or disable a rule; false when the id is unknown
    pub fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        match self.write().get_mut(id) {
            Some(rule) => {
                rule.enabled = enabled;
                tracing::info!("Rule {} {}", id, if enabled { "enabled" } else { "disabled" });
                true
            }
            None => false,
        }
    }

    /// Change a rule's weight; false when the id is unknown
    pub fn set_weight(&self, id: &str, weight: f64) -> bool {
        match self.write().get_mut(id) {
            Some(rule) => {
                rule.weight = weight.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<ValidationRule> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Every rule, ordered by id
    pub fn list(&self) -> Vec<RuleInfo> {
        let mut rules: Vec<RuleInfo> = self.read().values().map(ValidationRule::info).collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules
    }

    /// Enabled rules that belong to `check_type`, ordered by id
    pub fn snapshot(&self, check_type: CheckType) -> Vec<ValidationRule> {
        let mut rules: Vec<ValidationRule> = self
            .read()
            .values()
            .filter(|r| r.enabled && check_type.includes(r.category))
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ValidationRule>> {
        self.rules.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ValidationRule>> {
        self.rules.write().unwrap_or_else(|e| e.into_inner())
    }
}
