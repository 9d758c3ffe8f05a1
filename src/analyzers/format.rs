//! In-text citation style and paragraph length.

use async_trait::async_trait;
use std::time::Instant;

use super::markers::{author_date_markers, numeric_markers};
use super::{paragraphs, penalty_score, AnalyzerError, Validator};
use crate::config::{FormatConfig, PenaltyConfig};
use crate::models::{
    CitationStyle, Document, IssueCode, IssueLocation, IssueType, RuleCategory, Severity,
    ValidationContext, ValidationIssue, ValidationResult,
};

/// Format scores below this fail
const FORMAT_PASS_THRESHOLD: f64 = 80.0;

fn style_issue(description: String, start: usize, end: usize, marker: &str) -> ValidationIssue {
    ValidationIssue::new(
        IssueType::FormatViolation,
        IssueCode::StyleViolation,
        Severity::Minor,
        description,
    )
    .at(IssueLocation::span(start, end))
    .evidence(marker)
}

/// Checks in-text citation markers against the style and flags overlong paragraphs
#[derive(Debug, Clone, Default)]
pub struct FormatChecker {
    config: FormatConfig,
    penalties: PenaltyConfig,
}

impl FormatChecker {
    pub fn new(config: FormatConfig, penalties: PenaltyConfig) -> Self {
        Self { config, penalties }
    }

    fn check_markers(&self, document: &Document, style: CitationStyle, issues: &mut Vec<ValidationIssue>) {
        let content = &document.content;
        let name = style.id().to_uppercase();

        if style == CitationStyle::Ieee {
            for m in author_date_markers(content) {
                let text = &content[m.start..m.end];
                issues.push(style_issue(
                    format!("IEEE uses numeric markers, found author-date marker {}", text),
                    m.start,
                    m.end,
                    text,
                ));
            }

            if !document.citations.is_empty() && numeric_markers(content).is_empty() {
                issues.push(
                    ValidationIssue::new(
                        IssueType::FormatViolation,
                        IssueCode::StyleViolation,
                        Severity::Minor,
                        "IEEE requires numeric reference markers such as [1] in the text",
                    )
                    .fix("Number references in order of first citation", false),
                );
            }
        } else {
            for m in numeric_markers(content) {
                let text = &content[m.start..m.end];
                issues.push(style_issue(
                    format!("{} uses author-based markers, found numeric marker {}", name, text),
                    m.start,
                    m.end,
                    text,
                ));
            }
        }
    }

    fn check_paragraphs(&self, content: &str, issues: &mut Vec<ValidationIssue>) {
        for para in paragraphs(content) {
            let words = para.text.split_whitespace().count();
            if words > self.config.max_paragraph_words {
                issues.push(
                    ValidationIssue::new(
                        IssueType::FormatViolation,
                        IssueCode::StyleViolation,
                        Severity::Warning,
                        format!(
                            "Paragraph {} has {} words (limit {})",
                            para.index, words, self.config.max_paragraph_words
                        ),
                    )
                    .at(IssueLocation::span(para.start, para.end).paragraph(para.index))
                    .fix("Split the paragraph", false),
                );
            }
        }
    }
}

#[async_trait]
impl Validator for FormatChecker {
    fn id(&self) -> &str {
        "format"
    }

    fn name(&self) -> &str {
        "Format and style"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Format
    }

    fn algorithm(&self) -> &str {
        "marker-style-scan"
    }

    async fn validate(
        &self,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, AnalyzerError> {
        let started = Instant::now();
        let mut issues = Vec::new();
        self.check_markers(document, context.citation_style, &mut issues);
        self.check_paragraphs(&document.content, &mut issues);

        let score = penalty_score(&issues, &self.penalties);
        let suggestions = if issues.is_empty() {
            Vec::new()
        } else {
            vec![format!(
                "Apply {} formatting throughout",
                context.citation_style.id().to_uppercase()
            )]
        };

        let mut result = ValidationResult::new(self.id(), self.category(), score, 100.0, issues)
            .passed_at(FORMAT_PASS_THRESHOLD)
            .suggestions(suggestions);
        result.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }
}
