//! Integrity checks, their lifecycle, and the aggregated report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::issue::ValidationIssue;
use super::result::{FabricationRisk, RuleCategory, ValidationResult};

/// Lifecycle state of a check; moves strictly forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl CheckStatus {
    /// Whether the check has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckStatus::Completed | CheckStatus::Failed)
    }

    /// Whether moving to `next` is a legal forward transition
    pub fn can_transition_to(&self, next: CheckStatus) -> bool {
        matches!(
            (self, next),
            (CheckStatus::Pending, CheckStatus::Running)
                | (CheckStatus::Pending, CheckStatus::Failed)
                | (CheckStatus::Running, CheckStatus::Completed)
                | (CheckStatus::Running, CheckStatus::Failed)
        )
    }

    /// Returns the identifier used in output
    pub fn id(&self) -> &'static str {
        match self {
            CheckStatus::Pending => "pending",
            CheckStatus::Running => "running",
            CheckStatus::Completed => "completed",
            CheckStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Which subset of rules a check runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    #[default]
    Full,
    Plagiarism,
    Citations,
    Data,
    Quick,
}

impl CheckType {
    /// Whether a rule of `category` belongs to this check type
    pub fn includes(&self, category: RuleCategory) -> bool {
        match self {
            CheckType::Full => true,
            CheckType::Plagiarism => category == RuleCategory::Plagiarism,
            CheckType::Citations => category == RuleCategory::Citation,
            CheckType::Data => category == RuleCategory::Data,
            CheckType::Quick => matches!(
                category,
                RuleCategory::Plagiarism | RuleCategory::Citation | RuleCategory::Format
            ),
        }
    }
}

/// Score per rule category, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub plagiarism: f64,
    pub citation: f64,
    pub data: f64,
    pub methodology: f64,
    pub format: f64,
    pub consistency: f64,
}

impl Default for CategoryScores {
    fn default() -> Self {
        Self {
            plagiarism: 100.0,
            citation: 100.0,
            data: 100.0,
            methodology: 100.0,
            format: 100.0,
            consistency: 100.0,
        }
    }
}

impl CategoryScores {
    /// Score for a category
    pub fn get(&self, category: RuleCategory) -> f64 {
        match category {
            RuleCategory::Plagiarism => self.plagiarism,
            RuleCategory::Citation => self.citation,
            RuleCategory::Data => self.data,
            RuleCategory::Methodology => self.methodology,
            RuleCategory::Format => self.format,
            RuleCategory::Consistency => self.consistency,
        }
    }

    /// Set the score for a category
    pub fn set(&mut self, category: RuleCategory, score: f64) {
        let slot = match category {
            RuleCategory::Plagiarism => &mut self.plagiarism,
            RuleCategory::Citation => &mut self.citation,
            RuleCategory::Data => &mut self.data,
            RuleCategory::Methodology => &mut self.methodology,
            RuleCategory::Format => &mut self.format,
            RuleCategory::Consistency => &mut self.consistency,
        };
        *slot = score;
    }
}

/// Aggregated outcome of a check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Weighted overall score in [0, 100]
    pub overall_score: f64,

    /// Mean score per category
    pub category_scores: CategoryScores,

    pub total_issues: usize,
    pub critical_issues: usize,
    pub major_issues: usize,
    pub minor_issues: usize,
    pub warning_issues: usize,

    /// Overall score met the threshold and no critical issues were found
    pub passed: bool,

    /// Highest fabrication risk reported by any rule
    pub fabrication_risk: FabricationRisk,

    /// Advice derived from category thresholds
    pub recommendations: Vec<String>,

    /// Per-rule results, ordered by rule id
    pub results: Vec<ValidationResult>,

    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl IntegrityReport {
    /// All issues across every rule
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.results.iter().flat_map(|r| r.issues.iter())
    }
}

/// Bookkeeping attached to a check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckMetadata {
    /// Rules that ran
    #[serde(default)]
    pub rules_run: Vec<String>,

    /// Algorithms used by those rules
    #[serde(default)]
    pub algorithms_used: Vec<String>,

    /// Wall time from start to terminal state
    #[serde(default)]
    pub processing_time_ms: u64,
}

/// One submitted integrity check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityCheck {
    pub id: String,
    pub document_id: String,
    pub check_type: CheckType,
    pub status: CheckStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Report, once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<IntegrityReport>,

    /// Check-level issues (set when the check failed)
    #[serde(default)]
    pub issues: Vec<ValidationIssue>,

    #[serde(default)]
    pub metadata: CheckMetadata,
}

impl IntegrityCheck {
    /// Create a pending check
    pub fn new(id: impl Into<String>, document_id: impl Into<String>, check_type: CheckType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            document_id: document_id.into(),
            check_type,
            status: CheckStatus::Pending,
            created_at: now,
            updated_at: now,
            report: None,
            issues: Vec::new(),
            metadata: CheckMetadata::default(),
        }
    }
}

/// Risk band for the quick score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Band a score: >= 80 low, >= 60 medium, else high
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Low
        } else if score >= 60.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Result of the cheap synchronous integrity estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickScore {
    pub score: f64,
    pub risk_level: RiskLevel,
    pub quick_issues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_forward_only() {
        assert!(CheckStatus::Pending.can_transition_to(CheckStatus::Running));
        assert!(CheckStatus::Running.can_transition_to(CheckStatus::Completed));
        assert!(CheckStatus::Running.can_transition_to(CheckStatus::Failed));
        assert!(CheckStatus::Pending.can_transition_to(CheckStatus::Failed));

        assert!(!CheckStatus::Running.can_transition_to(CheckStatus::Pending));
        assert!(!CheckStatus::Completed.can_transition_to(CheckStatus::Running));
        assert!(!CheckStatus::Failed.can_transition_to(CheckStatus::Completed));
        assert!(!CheckStatus::Pending.can_transition_to(CheckStatus::Completed));
    }

    #[test]
    fn test_check_type_includes() {
        assert!(CheckType::Full.includes(RuleCategory::Methodology));
        assert!(CheckType::Citations.includes(RuleCategory::Citation));
        assert!(!CheckType::Citations.includes(RuleCategory::Data));
        assert!(!CheckType::Quick.includes(RuleCategory::Data));
    }

    #[test]
    fn test_category_scores_get_set() {
        let mut scores = CategoryScores::default();
        scores.set(RuleCategory::Format, 42.0);
        assert_eq!(scores.get(RuleCategory::Format), 42.0);
        assert_eq!(scores.get(RuleCategory::Data), 100.0);
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(95.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(70.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(10.0), RiskLevel::High);
    }
}
