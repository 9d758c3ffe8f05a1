//! Validation rules: named, weighted wrappers around analyzers.
//!
//! A [`ValidationRule`] pairs a [`Validator`] with the id, weight and baseline
//! severity the engine reports and aggregates it under. Rules live in a
//! [`RuleRegistry`]; a check takes a snapshot of the enabled rules when it
//! starts, so enabling or disabling a rule never affects a check in flight.

mod registry;

pub use registry::RuleRegistry;

use serde::Serialize;
use std::sync::Arc;

use crate::analyzers::{assign_issue_ids, AnalyzerError, Validator};
use crate::models::{
    Document, RuleCategory, Severity, ValidationContext, ValidationResult,
};

/// A weighted, toggleable validation rule
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub id: String,
    pub name: String,
    pub category: RuleCategory,

    /// Severity the rule's findings usually carry
    pub severity: Severity,

    /// Weight in the overall score, in [0, 1]
    pub weight: f64,

    pub enabled: bool,
    validator: Arc<dyn Validator>,
}

impl ValidationRule {
    /// Wrap a validator, taking id, name and category from it
    pub fn new(validator: Arc<dyn Validator>, severity: Severity, weight: f64) -> Self {
        Self {
            id: validator.id().to_string(),
            name: validator.name().to_string(),
            category: validator.category(),
            severity,
            weight: weight.clamp(0.0, 1.0),
            enabled: true,
            validator,
        }
    }

    /// Override the rule id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Start disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Name of the technique the rule uses
    pub fn algorithm(&self) -> &str {
        self.validator.algorithm()
    }

    /// Run the rule; the result carries this rule's id and numbered issues
    pub async fn evaluate(
        &self,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, AnalyzerError> {
        let mut result = self.validator.validate(document, context).await?;
        result.rule_id = self.id.clone();
        result.category = self.category;
        assign_issue_ids(&self.id, &mut result.issues);
        Ok(result)
    }

    /// Serializable description
    pub fn info(&self) -> RuleInfo {
        RuleInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category,
            severity: self.severity,
            weight: self.weight,
            enabled: self.enabled,
            algorithm: self.algorithm().to_string(),
        }
    }
}

/// Rule as listed by the CLI and the MCP server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleInfo {
    pub id: String,
    pub name: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub weight: f64,
    pub enabled: bool,
    pub algorithm: String,
}
