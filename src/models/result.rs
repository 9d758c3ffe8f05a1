//! Per-rule validation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::issue::{IssueCode, IssueType, Severity, ValidationIssue};

/// Category a validation rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Plagiarism,
    Citation,
    Data,
    Methodology,
    Format,
    Consistency,
}

impl RuleCategory {
    /// All categories, in report order
    pub const ALL: [RuleCategory; 6] = [
        RuleCategory::Plagiarism,
        RuleCategory::Citation,
        RuleCategory::Data,
        RuleCategory::Methodology,
        RuleCategory::Format,
        RuleCategory::Consistency,
    ];

    /// Returns the identifier used in output
    pub fn id(&self) -> &'static str {
        match self {
            RuleCategory::Plagiarism => "plagiarism",
            RuleCategory::Citation => "citation",
            RuleCategory::Data => "data",
            RuleCategory::Methodology => "methodology",
            RuleCategory::Format => "format",
            RuleCategory::Consistency => "consistency",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Estimate that a citation or data point was invented
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum FabricationRisk {
    #[default]
    Low,
    Medium,
    High,
}

impl FabricationRisk {
    /// Raise the risk by one level, saturating at high
    pub fn escalate(self) -> Self {
        match self {
            FabricationRisk::Low => FabricationRisk::Medium,
            FabricationRisk::Medium | FabricationRisk::High => FabricationRisk::High,
        }
    }
}

/// Bookkeeping attached to every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Wall time spent in the rule
    pub processing_time_ms: u64,

    /// External sources actually queried
    #[serde(default)]
    pub sources_queried: Vec<String>,

    /// External lookups that could not give an answer (rate limit, open circuit, timeout)
    #[serde(default)]
    pub inconclusive_lookups: usize,

    /// When the result was produced
    pub timestamp: DateTime<Utc>,
}

impl Default for ResultMetadata {
    fn default() -> Self {
        Self {
            processing_time_ms: 0,
            sources_queried: Vec::new(),
            inconclusive_lookups: 0,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of running one rule against one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Rule that produced this result
    pub rule_id: String,

    /// Category of that rule
    pub category: RuleCategory,

    /// Whether the rule passed
    pub passed: bool,

    /// Score in [0, 100]
    pub score: f64,

    /// Confidence in [0, 100]
    pub confidence: f64,

    /// Issues found
    #[serde(default)]
    pub issues: Vec<ValidationIssue>,

    /// Suggestions for the author
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Fabrication risk estimate, where the rule computes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabrication_risk: Option<FabricationRisk>,

    /// Bookkeeping
    pub metadata: ResultMetadata,
}

impl ValidationResult {
    /// Create a result; score and confidence are clamped into [0, 100]
    pub fn new(
        rule_id: impl Into<String>,
        category: RuleCategory,
        score: f64,
        confidence: f64,
        issues: Vec<ValidationIssue>,
    ) -> Self {
        let score = clamp_score(score);
        let passed = score >= 50.0 && !issues.iter().any(|i| i.severity == Severity::Critical);
        Self {
            rule_id: rule_id.into(),
            category,
            passed,
            score,
            confidence: clamp_score(confidence),
            issues,
            suggestions: Vec::new(),
            fabrication_risk: None,
            metadata: ResultMetadata::default(),
        }
    }

    /// Synthetic result for a rule whose evaluator failed
    pub fn failed(rule_id: impl Into<String>, category: RuleCategory, reason: &str) -> Self {
        let rule_id = rule_id.into();
        let issue = ValidationIssue::new(
            IssueType::LogicalError,
            IssueCode::RuleExecutionError,
            Severity::Critical,
            format!("Rule '{}' failed to execute: {}", rule_id, reason),
        );
        let mut result = Self::new(rule_id, category, 0.0, 0.0, vec![issue]);
        result.passed = false;
        result
    }

    /// Override the pass decision with a threshold
    pub fn passed_at(mut self, threshold: f64) -> Self {
        self.passed = self.score >= threshold
            && !self.issues.iter().any(|i| i.severity == Severity::Critical);
        self
    }

    /// Add suggestions
    pub fn suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Set the fabrication risk
    pub fn fabrication_risk(mut self, risk: FabricationRisk) -> Self {
        self.fabrication_risk = Some(risk);
        self
    }

    /// Set queried sources and inconclusive lookups
    pub fn lookups(mut self, sources_queried: Vec<String>, inconclusive: usize) -> Self {
        self.metadata.sources_queried = sources_queried;
        self.metadata.inconclusive_lookups = inconclusive;
        self
    }

    /// Count issues at a given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Clamp a score into [0, 100], mapping NaN to 0
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_clamps_scores() {
        let result = ValidationResult::new("r", RuleCategory::Data, 140.0, -3.0, vec![]);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.confidence, 0.0);
        assert!(result.passed);

        assert_eq!(clamp_score(f64::NAN), 0.0);
    }

    #[test]
    fn test_failed_result() {
        let result = ValidationResult::failed("citations", RuleCategory::Citation, "boom");
        assert!(!result.passed);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.count(Severity::Critical), 1);
        assert_eq!(result.issues[0].code, IssueCode::RuleExecutionError);
        assert_eq!(result.issues[0].issue_type, IssueType::LogicalError);
    }

    #[test]
    fn test_fabrication_risk_escalates() {
        assert_eq!(FabricationRisk::Low.escalate(), FabricationRisk::Medium);
        assert_eq!(FabricationRisk::Medium.escalate(), FabricationRisk::High);
        assert_eq!(FabricationRisk::High.escalate(), FabricationRisk::High);
    }
}
