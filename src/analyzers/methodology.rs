//! Methodology rigor by paradigm-specific method markers.

use async_trait::async_trait;
use std::time::Instant;

use super::{AnalyzerError, Validator};
use crate::models::{
    Document, IssueCode, IssueLocation, IssueType, Paradigm, RuleCategory, Severity,
    ValidationContext, ValidationIssue, ValidationResult,
};

/// A method marker and the spellings that count as finding it
struct Marker {
    label: &'static str,
    spellings: &'static [&'static str],
}

const fn marker(label: &'static str, spellings: &'static [&'static str]) -> Marker {
    Marker { label, spellings }
}

const QUANTITATIVE: &[Marker] = &[
    marker("sample", &["sample"]),
    marker("statistical analysis", &["statistical"]),
    marker("significance level", &["p <", "p<", "p ="]),
    marker("regression", &["regression"]),
    marker("hypothesis", &["hypothes"]),
];

const QUALITATIVE: &[Marker] = &[
    marker("interviews", &["interview"]),
    marker("thematic analysis", &["thematic"]),
    marker("participants", &["participant"]),
    marker("coding", &["coding", "coded"]),
    marker("saturation", &["saturation"]),
];

const MIXED: &[Marker] = &[
    marker("sample", &["sample"]),
    marker("statistical analysis", &["statistical"]),
    marker("interviews", &["interview"]),
    marker("thematic analysis", &["thematic"]),
    marker("integration of strands", &["triangulat", "integrat"]),
];

fn markers_for(paradigm: Paradigm) -> &'static [Marker] {
    match paradigm {
        Paradigm::Quantitative => QUANTITATIVE,
        Paradigm::Qualitative => QUALITATIVE,
        Paradigm::Mixed => MIXED,
        Paradigm::Theoretical => &[],
    }
}

/// Keyword check for the methods a paradigm is expected to report
#[derive(Debug, Clone, Default)]
pub struct MethodologyChecker;

impl MethodologyChecker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Validator for MethodologyChecker {
    fn id(&self) -> &str {
        "methodology"
    }

    fn name(&self) -> &str {
        "Methodology rigor"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Methodology
    }

    fn algorithm(&self) -> &str {
        "paradigm-marker-scan"
    }

    async fn validate(
        &self,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, AnalyzerError> {
        let started = Instant::now();
        let expected = markers_for(context.paradigm);

        let (score, issues) = if expected.is_empty() {
            (100.0, Vec::new())
        } else {
            let text = document.content.to_lowercase();
            let missing: Vec<&Marker> = expected
                .iter()
                .filter(|m| !m.spellings.iter().any(|s| text.contains(s)))
                .collect();

            let found = expected.len() - missing.len();
            let issues = missing
                .iter()
                .map(|m| {
                    ValidationIssue::new(
                        IssueType::LogicalError,
                        IssueCode::MethodologyGap,
                        Severity::Warning,
                        format!("No mention of {} in the methods", m.label),
                    )
                    .at(IssueLocation::section("methodology"))
                    .fix(format!("Describe the {} used", m.label), false)
                })
                .collect();
            (found as f64 / expected.len() as f64 * 100.0, issues)
        };

        let suggestions = if issues.is_empty() {
            Vec::new()
        } else {
            vec!["Strengthen the methodology description".to_string()]
        };

        // Keyword presence says little about rigor itself
        let mut result = ValidationResult::new(self.id(), self.category(), score, 70.0, issues)
            .passed_at(context.thresholds.methodology_rigor)
            .suggestions(suggestions);
        result.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }
}
