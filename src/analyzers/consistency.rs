//! Agreement between in-text citations and the reference list.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Instant;

use super::markers::{author_date_markers, author_page_markers, numeric_markers, AuthorMarker};
use super::{penalty_score, AnalyzerError, Validator};
use crate::config::PenaltyConfig;
use crate::models::{
    Citation, CitationStyle, Document, IssueCode, IssueLocation, IssueType, RuleCategory,
    Severity, ValidationContext, ValidationIssue, ValidationResult,
};

/// Lowercased surnames of every author of a reference
fn surnames(citation: &Citation) -> Vec<String> {
    citation
        .author_list()
        .into_iter()
        .filter_map(|author| match author.split_once(',') {
            Some((last, _)) => Some(last.trim().to_lowercase()),
            None => author.split_whitespace().last().map(str::to_lowercase),
        })
        .collect()
}

fn matches_reference(marker: &AuthorMarker, citation: &Citation) -> bool {
    let surname = marker.surname.to_lowercase();
    let year_ok = match (marker.year, citation.year) {
        (Some(cited), Some(listed)) => cited == listed,
        _ => true,
    };
    year_ok && surnames(citation).contains(&surname)
}

fn mismatch(description: String, start: usize, end: usize) -> ValidationIssue {
    ValidationIssue::new(
        IssueType::LogicalError,
        IssueCode::CrossReferenceMismatch,
        Severity::Major,
        description,
    )
    .at(IssueLocation::span(start, end))
}

/// Cross-checks in-text citations against the reference list
#[derive(Debug, Clone, Default)]
pub struct ConsistencyChecker {
    penalties: PenaltyConfig,
}

impl ConsistencyChecker {
    pub fn new(penalties: PenaltyConfig) -> Self {
        Self { penalties }
    }

    /// Issues for unmatched in-text markers, plus the indices of cited references
    fn check_markers(&self, document: &Document, style: CitationStyle) -> (Vec<ValidationIssue>, HashSet<usize>) {
        let content = &document.content;
        let citations = &document.citations;
        let mut issues = Vec::new();
        let mut cited = HashSet::new();

        if style == CitationStyle::Ieee {
            for marker in numeric_markers(content) {
                for n in &marker.numbers {
                    if (1..=citations.len()).contains(n) {
                        cited.insert(n - 1);
                    } else {
                        issues.push(mismatch(
                            format!("In-text marker [{}] has no matching reference", n),
                            marker.start,
                            marker.end,
                        ));
                    }
                }
            }
            return (issues, cited);
        }

        let markers = if style == CitationStyle::Mla {
            author_page_markers(content)
        } else {
            author_date_markers(content)
        };

        for marker in markers {
            let mut found = false;
            for (i, citation) in citations.iter().enumerate() {
                if matches_reference(&marker, citation) {
                    cited.insert(i);
                    found = true;
                }
            }

            if !found {
                let cited_as = match marker.year {
                    Some(year) => format!("{} ({})", marker.surname, year),
                    None => marker.surname.clone(),
                };
                issues.push(
                    mismatch(
                        format!("In-text citation {} does not appear in the references", cited_as),
                        marker.start,
                        marker.end,
                    )
                    .evidence(&content[marker.start..marker.end]),
                );
            }
        }
        (issues, cited)
    }
}

#[async_trait]
impl Validator for ConsistencyChecker {
    fn id(&self) -> &str {
        "consistency"
    }

    fn name(&self) -> &str {
        "Internal consistency"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Consistency
    }

    fn algorithm(&self) -> &str {
        "in-text-reference-match"
    }

    async fn validate(
        &self,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, AnalyzerError> {
        let started = Instant::now();
        let (mut issues, cited) = self.check_markers(document, context.citation_style);

        for (i, citation) in document.citations.iter().enumerate() {
            if !cited.contains(&i) {
                issues.push(
                    ValidationIssue::new(
                        IssueType::LogicalError,
                        IssueCode::CrossReferenceMismatch,
                        Severity::Warning,
                        format!("Reference '{}' is never cited in the text", citation.label()),
                    )
                    .at(IssueLocation::section(citation.label()))
                    .fix("Cite the reference or remove it from the list", false),
                );
            }
        }

        let score = penalty_score(&issues, &self.penalties);
        let suggestions = if issues.iter().any(|i| i.severity == Severity::Major) {
            vec!["Add the missing references or correct the in-text citations".to_string()]
        } else {
            Vec::new()
        };

        let mut result = ValidationResult::new(self.id(), self.category(), score, 100.0, issues)
            .suggestions(suggestions);
        result.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }
}
