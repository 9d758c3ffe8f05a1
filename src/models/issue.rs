//! Validation issues raised by analyzers.

use serde::{Deserialize, Serialize};

/// Severity of an issue, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Minor,
    Major,
    Critical,
}

impl Severity {
    /// Returns the identifier used in output
    pub fn id(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Broad kind of issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Plagiarism,
    CitationError,
    DataInconsistency,
    FormatViolation,
    LogicalError,
}

impl IssueType {
    /// Returns the identifier used in output
    pub fn id(&self) -> &'static str {
        match self {
            IssueType::Plagiarism => "plagiarism",
            IssueType::CitationError => "citation_error",
            IssueType::DataInconsistency => "data_inconsistency",
            IssueType::FormatViolation => "format_violation",
            IssueType::LogicalError => "logical_error",
        }
    }
}

/// Machine-readable reason code for an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    MissingField,
    InvalidType,
    InvalidPattern,
    InvalidValue,
    CrossReferenceMismatch,
    PlagiarismMatch,
    CitationMissing,
    CitationInvalidDoi,
    CitationUnverified,
    DuplicateCitation,
    StyleViolation,
    MethodologyGap,
    RuleExecutionError,
    RateLimitExceeded,
    CircuitOpen,
    LookupTimeout,
}

impl IssueCode {
    /// Returns the identifier used in output
    pub fn id(&self) -> &'static str {
        match self {
            IssueCode::MissingField => "missing_field",
            IssueCode::InvalidType => "invalid_type",
            IssueCode::InvalidPattern => "invalid_pattern",
            IssueCode::InvalidValue => "invalid_value",
            IssueCode::CrossReferenceMismatch => "cross_reference_mismatch",
            IssueCode::PlagiarismMatch => "plagiarism_match",
            IssueCode::CitationMissing => "citation_missing",
            IssueCode::CitationInvalidDoi => "citation_invalid_doi",
            IssueCode::CitationUnverified => "citation_unverified",
            IssueCode::DuplicateCitation => "duplicate_citation",
            IssueCode::StyleViolation => "style_violation",
            IssueCode::MethodologyGap => "methodology_gap",
            IssueCode::RuleExecutionError => "rule_execution_error",
            IssueCode::RateLimitExceeded => "rate_limit_exceeded",
            IssueCode::CircuitOpen => "circuit_open",
            IssueCode::LookupTimeout => "lookup_timeout",
        }
    }

    /// Codes reporting a lookup that gave no answer; these never cost score
    pub fn is_inconclusive(&self) -> bool {
        matches!(
            self,
            IssueCode::RateLimitExceeded | IssueCode::CircuitOpen | IssueCode::LookupTimeout
        )
    }
}

/// Where in the document an issue was found
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueLocation {
    /// Section name, reference id, or data field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Paragraph number (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<usize>,

    /// Line number (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// Start byte offset into the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_start: Option<usize>,

    /// End byte offset into the content (exclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_end: Option<usize>,
}

impl IssueLocation {
    /// Location naming a section, reference or field
    pub fn section(name: impl Into<String>) -> Self {
        Self {
            section: Some(name.into()),
            ..Default::default()
        }
    }

    /// Location spanning a byte range of the content
    pub fn span(start: usize, end: usize) -> Self {
        Self {
            char_start: Some(start),
            char_end: Some(end),
            ..Default::default()
        }
    }

    /// Set the paragraph index
    pub fn paragraph(mut self, paragraph: usize) -> Self {
        self.paragraph = Some(paragraph);
        self
    }

    /// Set the line number
    pub fn line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// A single problem found by a validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Identifier, assigned by the rule that produced the issue
    pub id: String,

    /// Kind of issue
    #[serde(rename = "type")]
    pub issue_type: IssueType,

    /// Reason code
    pub code: IssueCode,

    /// Severity
    pub severity: Severity,

    /// Human-readable description
    pub description: String,

    /// Location in the document
    #[serde(default)]
    pub location: IssueLocation,

    /// Supporting evidence (matched text, offending value, ...)
    #[serde(default)]
    pub evidence: Vec<String>,

    /// Suggested replacement or action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,

    /// Whether the fix can be applied mechanically
    #[serde(default)]
    pub auto_fixable: bool,
}

impl ValidationIssue {
    /// Create an issue; the id is filled in when the owning rule finishes
    pub fn new(
        issue_type: IssueType,
        code: IssueCode,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            issue_type,
            code,
            severity,
            description: description.into(),
            location: IssueLocation::default(),
            evidence: Vec::new(),
            suggested_fix: None,
            auto_fixable: false,
        }
    }

    /// Set the location
    pub fn at(mut self, location: IssueLocation) -> Self {
        self.location = location;
        self
    }

    /// Add a piece of evidence
    pub fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence.push(evidence.into());
        self
    }

    /// Attach a fix; `auto` marks it as mechanically applicable
    pub fn fix(mut self, fix: impl Into<String>, auto: bool) -> Self {
        self.suggested_fix = Some(fix.into());
        self.auto_fixable = auto;
        self
    }

    /// Mark the issue as auto-fixable without a concrete replacement
    pub fn auto_fixable(mut self) -> Self {
        self.auto_fixable = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Minor);
        assert!(Severity::Minor > Severity::Warning);
    }

    #[test]
    fn test_issue_serialization() {
        let issue = ValidationIssue::new(
            IssueType::CitationError,
            IssueCode::CitationMissing,
            Severity::Major,
            "missing authors",
        )
        .at(IssueLocation::section("ref1"))
        .fix("add authors", false);

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "citation_error");
        assert_eq!(json["code"], "citation_missing");
        assert_eq!(json["severity"], "major");
        assert_eq!(json["location"]["section"], "ref1");
        assert!(json["location"].get("line").is_none());
    }
}
