//! Document analyzers.
//!
//! Each analyzer implements [`Validator`] and examines one aspect of a
//! document. Analyzers are stateless between calls apart from the shared
//! [`ResourceGovernor`](crate::governor::ResourceGovernor) they route
//! external lookups through, so the same document and context always
//! produce the same result when external state does not change.

mod citation;
mod consistency;
mod data;
mod format;
mod markers;
mod methodology;
mod plagiarism;

pub use citation::CitationValidator;
pub use consistency::ConsistencyChecker;
pub use data::DataConsistencyChecker;
pub use format::FormatChecker;
pub(crate) use markers::{author_date_markers, author_page_markers, numeric_markers};
pub use methodology::MethodologyChecker;
pub use plagiarism::{PlagiarismDetector, PlagiarismReport, SegmentMatch};

use async_trait::async_trait;

use crate::config::PenaltyConfig;
use crate::models::{
    clamp_score, Document, RuleCategory, ValidationContext, ValidationIssue, ValidationResult,
};

/// Interface every analyzer implements
#[async_trait]
pub trait Validator: Send + Sync + std::fmt::Debug {
    /// Stable identifier, also used as the default rule id
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Category the analyzer's results count towards
    fn category(&self) -> RuleCategory;

    /// Name of the technique used, reported in check metadata
    fn algorithm(&self) -> &str;

    /// Examine `document` under `context`
    async fn validate(
        &self,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, AnalyzerError>;
}

/// Errors raised while running an analyzer
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// The document cannot be analyzed as given
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A collaborator failed in a way the analyzer cannot absorb
    #[error("Source error: {0}")]
    Source(#[from] crate::sources::SourceError),

    #[error("Analyzer error: {0}")]
    Other(String),
}

/// 100 minus the configured penalty of every issue, clamped to [0, 100]
///
/// Issues recording an inconclusive lookup carry no penalty.
pub fn penalty_score(issues: &[ValidationIssue], penalties: &PenaltyConfig) -> f64 {
    let deducted: f64 = issues
        .iter()
        .filter(|issue| !issue.code.is_inconclusive())
        .map(|issue| penalties.for_severity(issue.severity))
        .sum();
    clamp_score(100.0 - deducted)
}

/// Give every issue a stable id derived from the rule and its position
pub fn assign_issue_ids(rule_id: &str, issues: &mut [ValidationIssue]) {
    for (i, issue) in issues.iter_mut().enumerate() {
        issue.id = format!("{}-{:03}", rule_id, i + 1);
    }
}

/// A paragraph of the document with its byte offsets
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Paragraph<'a> {
    pub index: usize,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split content on blank lines, keeping byte offsets
pub(crate) fn paragraphs(content: &str) -> Vec<Paragraph<'_>> {
    let mut result = Vec::new();
    let mut start: Option<usize> = None;
    let mut last_end = 0;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                result.push((s, last_end));
            }
        } else {
            start.get_or_insert(line_start);
            last_end = line_start + line.trim_end().len();
        }
    }
    if let Some(s) = start {
        result.push((s, last_end));
    }

    result
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| Paragraph {
            index: index + 1,
            text: &content[start..end],
            start,
            end,
        })
        .collect()
}

/// Whitespace-separated words with their byte offsets
pub(crate) fn word_spans(content: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (i, ch) in content.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, content.len()));
    }
    spans
}
