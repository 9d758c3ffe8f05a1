//! Citation validation: required fields, DOIs, author sanity, style and duplicates.

use async_trait::async_trait;
use chrono::Datelike;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use super::{penalty_score, AnalyzerError, Validator};
use crate::config::PenaltyConfig;
use crate::governor::{validate_doi, ExternalOutcome, ResourceGovernor};
use crate::models::{
    Citation, CitationStyle, CitationType, Document, FabricationRisk, IssueCode, IssueLocation,
    IssueType, RuleCategory, Severity, ValidationContext, ValidationIssue, ValidationResult,
};
use crate::sources::SourceRegistry;

/// Earliest plausible publication year (movable type)
const EARLIEST_YEAR: i32 = 1450;

const PLACEHOLDER_AUTHORS: &[&str] = &[
    "anonymous", "unknown", "author", "authors", "test", "lorem", "ipsum", "xxx", "n/a", "tbd",
    "john doe", "jane doe",
];

/// Fields a reference of `kind` must carry under `style`
fn required_fields(kind: CitationType, style: CitationStyle) -> Vec<&'static str> {
    let mut fields = match kind {
        CitationType::Journal => vec!["authors", "title", "year", "journal"],
        CitationType::Book => vec!["authors", "title", "year", "publisher"],
        CitationType::Conference => vec!["authors", "title", "year", "journal"],
        CitationType::Thesis | CitationType::Report => vec!["authors", "title", "year", "publisher"],
        CitationType::Website => vec!["title", "url"],
        CitationType::Other => vec!["title"],
    };

    match (kind, style) {
        (CitationType::Journal, CitationStyle::Apa | CitationStyle::Chicago) => fields.push("volume"),
        (CitationType::Journal, CitationStyle::Ieee | CitationStyle::Mla) => {
            fields.extend(["volume", "pages"])
        }
        (CitationType::Conference, CitationStyle::Ieee) => fields.push("pages"),
        (CitationType::Website, CitationStyle::Mla | CitationStyle::Harvard) => fields.push("accessed"),
        (CitationType::Website, CitationStyle::Apa) => fields.push("year"),
        _ => {}
    }
    fields
}

fn apa_author_regex() -> &'static Regex {
    static APA: OnceLock<Regex> = OnceLock::new();
    APA.get_or_init(|| {
        Regex::new(r"^[\p{L}'’\- ]+, \p{Lu}\.(?:[ -]?\p{Lu}\.)*$").expect("valid APA author regex")
    })
}

/// Rewrite an author name as "Last, F. M.", if it looks like a name at all
fn apa_author(name: &str) -> Option<String> {
    let (surname, given) = match name.split_once(',') {
        Some((last, first)) => (last.trim().to_string(), first.trim().to_string()),
        None => {
            let words: Vec<&str> = name.split_whitespace().collect();
            let (last, rest) = words.split_last()?;
            (last.to_string(), rest.join(" "))
        }
    };

    let initials: Vec<String> = given
        .split(|c: char| c.is_whitespace() || c == '.')
        .filter_map(|part| part.chars().find(|c| c.is_alphabetic()))
        .map(|c| format!("{}.", c.to_uppercase()))
        .collect();

    if surname.is_empty() || initials.is_empty() {
        return None;
    }
    Some(format!("{}, {}", surname, initials.join(" ")))
}

/// Whether the given-name part of an author is initials only
fn has_initials_only(name: &str) -> bool {
    let given = match name.split_once(',') {
        Some((_, first)) => first.to_string(),
        None => {
            let words: Vec<&str> = name.split_whitespace().collect();
            match words.split_last() {
                Some((_, rest)) => rest.join(" "),
                None => return false,
            }
        }
    };

    let parts: Vec<&str> = given
        .split(|c: char| c.is_whitespace() || c == '.')
        .filter(|p| !p.is_empty())
        .collect();
    !parts.is_empty() && parts.iter().all(|p| p.chars().count() == 1)
}

fn is_suspicious_author(name: &str, sole_author: bool) -> bool {
    let lower = name.trim().trim_end_matches('.').to_lowercase();
    if lower == "et al" {
        return sole_author;
    }

    let letters = lower.chars().filter(|c| c.is_alphabetic()).count();
    PLACEHOLDER_AUTHORS.contains(&lower.as_str())
        || lower.contains("lorem")
        || lower.contains("xxx")
        || lower.chars().any(|c| c.is_ascii_digit())
        || letters <= 1
}

fn normalized_title(citation: &Citation) -> Option<String> {
    let title = citation.title.as_deref()?.trim().to_lowercase();
    (!title.is_empty()).then_some(title)
}

/// What a guarded lookup said about a citation
enum Lookup {
    Confirmed,
    Rejected,
    Inconclusive(Option<IssueCode>),
}

impl From<ExternalOutcome<bool>> for Lookup {
    fn from(outcome: ExternalOutcome<bool>) -> Self {
        match outcome {
            ExternalOutcome::Resolved(true) => Lookup::Confirmed,
            ExternalOutcome::Resolved(false) => Lookup::Rejected,
            other => Lookup::Inconclusive(other.issue_code()),
        }
    }
}

#[derive(Debug, Default)]
struct Findings {
    issues: Vec<ValidationIssue>,
    confidence: f64,
    risk: FabricationRisk,
    inconclusive: usize,
    sources_queried: Vec<String>,
    missing_fields: bool,
    style_fixes: bool,
}

impl Findings {
    fn queried(&mut self, source: &str) {
        if !self.sources_queried.iter().any(|s| s == source) {
            self.sources_queried.push(source.to_string());
        }
    }

    fn inconclusive(&mut self, citation: &Citation, what: &str, code: Option<IssueCode>) {
        self.confidence -= 5.0;
        self.inconclusive += 1;
        if let Some(code) = code {
            self.issues.push(
                ValidationIssue::new(
                    IssueType::CitationError,
                    code,
                    Severity::Warning,
                    format!("{} lookup for '{}' was skipped", what, citation.label()),
                )
                .at(IssueLocation::section(citation.label())),
            );
        }
    }
}

/// Validates a document's reference list
#[derive(Debug, Clone)]
pub struct CitationValidator {
    penalties: PenaltyConfig,
    sources: SourceRegistry,
    governor: Arc<ResourceGovernor>,
}

impl CitationValidator {
    pub fn new(penalties: PenaltyConfig, sources: SourceRegistry, governor: Arc<ResourceGovernor>) -> Self {
        Self {
            penalties,
            sources,
            governor,
        }
    }

    fn check_fields(&self, citation: &Citation, style: CitationStyle, findings: &mut Findings) {
        for field in required_fields(citation.citation_type, style) {
            if citation.has_field(field) {
                continue;
            }
            findings.missing_fields = true;
            findings.issues.push(
                ValidationIssue::new(
                    IssueType::CitationError,
                    IssueCode::CitationMissing,
                    Severity::Major,
                    format!(
                        "Reference '{}' ({}) is missing required field '{}' for {}",
                        citation.label(),
                        citation.citation_type,
                        field,
                        style.id().to_uppercase()
                    ),
                )
                .at(IssueLocation::section(citation.label()))
                .fix(format!("Add the {} of the cited work", field), false),
            );
        }
    }

    /// Returns the citation's own fabrication risk contribution
    async fn check_doi(
        &self,
        citation: &Citation,
        context: &ValidationContext,
        findings: &mut Findings,
    ) -> FabricationRisk {
        let Some(raw) = citation.doi.as_deref().filter(|d| !d.trim().is_empty()) else {
            return FabricationRisk::Low;
        };

        let doi = match validate_doi(raw) {
            Ok(doi) => doi,
            Err(e) => {
                findings.confidence -= 10.0;
                findings.issues.push(
                    ValidationIssue::new(
                        IssueType::CitationError,
                        IssueCode::CitationInvalidDoi,
                        Severity::Major,
                        format!("Reference '{}' has a malformed DOI", citation.label()),
                    )
                    .at(IssueLocation::section(citation.label()))
                    .evidence(e.to_string())
                    .fix("Use the form 10.<registrant>/<suffix>", false),
                );
                return FabricationRisk::Medium;
            }
        };

        if !context.external_sources.doi {
            return FabricationRisk::Low;
        }
        let Some(resolver) = self.sources.doi_resolver() else {
            return FabricationRisk::Low;
        };

        let source = resolver.id().to_string();
        findings.queried(&source);
        let key = format!("doi:{}", doi.to_lowercase());
        let outcome = self
            .governor
            .guarded_call(&source, &key, || resolver.resolve(&doi))
            .await;

        match Lookup::from(outcome) {
            Lookup::Confirmed => FabricationRisk::Low,
            Lookup::Rejected => {
                findings.confidence -= 10.0;
                findings.issues.push(
                    ValidationIssue::new(
                        IssueType::CitationError,
                        IssueCode::CitationInvalidDoi,
                        Severity::Major,
                        format!("DOI {} of reference '{}' does not resolve", doi, citation.label()),
                    )
                    .at(IssueLocation::section(citation.label()))
                    .evidence(doi.clone()),
                );
                FabricationRisk::Medium
            }
            Lookup::Inconclusive(code) => {
                findings.inconclusive(citation, "DOI", code);
                FabricationRisk::Low
            }
        }
    }

    async fn check_crossref(
        &self,
        citation: &Citation,
        context: &ValidationContext,
        findings: &mut Findings,
    ) -> FabricationRisk {
        if !context.external_sources.crossref {
            return FabricationRisk::Low;
        }
        let Some(verifier) = self.sources.citation_verifier() else {
            return FabricationRisk::Low;
        };

        let source = verifier.id().to_string();
        findings.queried(&source);
        let key = format!(
            "{}:{}|{}|{}",
            source,
            citation.doi.as_deref().unwrap_or_default().to_lowercase(),
            normalized_title(citation).unwrap_or_default(),
            citation.authors.to_lowercase()
        );
        let outcome = self
            .governor
            .guarded_call(&source, &key, || verifier.verify(citation))
            .await;

        match Lookup::from(outcome) {
            Lookup::Confirmed => FabricationRisk::Low,
            Lookup::Rejected => {
                findings.issues.push(
                    ValidationIssue::new(
                        IssueType::CitationError,
                        IssueCode::CitationUnverified,
                        Severity::Minor,
                        format!(
                            "Reference '{}' could not be matched to a bibliographic record",
                            citation.label()
                        ),
                    )
                    .at(IssueLocation::section(citation.label()))
                    .fix("Check the title, authors and year against the published work", false),
                );
                FabricationRisk::Medium
            }
            Lookup::Inconclusive(code) => {
                findings.inconclusive(citation, "Bibliographic", code);
                FabricationRisk::Low
            }
        }
    }

    fn check_plausibility(&self, citation: &Citation, findings: &mut Findings) -> FabricationRisk {
        let mut risk = FabricationRisk::Low;
        let authors = citation.author_list();

        let suspicious: Vec<&str> = authors
            .iter()
            .copied()
            .filter(|a| is_suspicious_author(a, authors.len() == 1))
            .collect();
        if !suspicious.is_empty() {
            risk = risk.escalate();
            let mut issue = ValidationIssue::new(
                IssueType::CitationError,
                IssueCode::InvalidValue,
                Severity::Warning,
                format!("Reference '{}' lists placeholder-like authors", citation.label()),
            )
            .at(IssueLocation::section(citation.label()));
            for author in suspicious {
                issue = issue.evidence(author);
            }
            findings.issues.push(issue);
        }

        if let Some(year) = citation.year {
            let current = chrono::Utc::now().year();
            if year > current || year < EARLIEST_YEAR {
                risk = risk.escalate();
                findings.issues.push(
                    ValidationIssue::new(
                        IssueType::CitationError,
                        IssueCode::InvalidValue,
                        Severity::Minor,
                        format!("Reference '{}' has an implausible year {}", citation.label(), year),
                    )
                    .at(IssueLocation::section(citation.label()))
                    .evidence(year.to_string()),
                );
            }
        }
        risk
    }

    fn check_style(&self, citation: &Citation, style: CitationStyle, findings: &mut Findings) {
        for author in citation.author_list() {
            if is_suspicious_author(author, false) {
                continue;
            }
            match style {
                CitationStyle::Apa if !apa_author_regex().is_match(author) => {
                    let Some(fixed) = apa_author(author) else {
                        continue;
                    };
                    findings.style_fixes = true;
                    findings.issues.push(
                        ValidationIssue::new(
                            IssueType::FormatViolation,
                            IssueCode::StyleViolation,
                            Severity::Minor,
                            format!(
                                "Author '{}' in reference '{}' is not in APA \"Last, F.\" form",
                                author,
                                citation.label()
                            ),
                        )
                        .at(IssueLocation::section(citation.label()))
                        .evidence(author)
                        .fix(fixed, true),
                    );
                }
                CitationStyle::Mla | CitationStyle::Chicago if has_initials_only(author) => {
                    findings.issues.push(
                        ValidationIssue::new(
                            IssueType::FormatViolation,
                            IssueCode::StyleViolation,
                            Severity::Warning,
                            format!(
                                "{} expects full first names; '{}' in reference '{}' uses initials",
                                style.id().to_uppercase(),
                                author,
                                citation.label()
                            ),
                        )
                        .at(IssueLocation::section(citation.label()))
                        .evidence(author),
                    );
                }
                _ => {}
            }
        }
    }

    fn check_duplicates(&self, citations: &[Citation], findings: &mut Findings) {
        let titles: Vec<Option<String>> = citations.iter().map(normalized_title).collect();

        for (i, title) in titles.iter().enumerate() {
            let Some(title) = title else { continue };
            let earlier = titles[..i].iter().enumerate().find(|(_, other)| {
                other
                    .as_deref()
                    .is_some_and(|other| strsim::jaro_winkler(title, other) >= 0.95)
            });

            if let Some((j, _)) = earlier {
                findings.issues.push(
                    ValidationIssue::new(
                        IssueType::CitationError,
                        IssueCode::DuplicateCitation,
                        Severity::Warning,
                        format!(
                            "Reference '{}' duplicates '{}'",
                            citations[i].label(),
                            citations[j].label()
                        ),
                    )
                    .at(IssueLocation::section(citations[i].label()))
                    .fix(format!("Merge with '{}'", citations[j].label()), false),
                );
            }
        }
    }

    fn suggestions(&self, findings: &Findings, style: CitationStyle) -> Vec<String> {
        let mut suggestions = Vec::new();
        if findings.missing_fields {
            suggestions.push("Complete the missing reference fields".to_string());
        }
        if findings.style_fixes {
            suggestions.push(format!(
                "Apply {} author formatting to the flagged references",
                style.id().to_uppercase()
            ));
        }
        if findings.risk >= FabricationRisk::Medium {
            suggestions.push(
                "Check the flagged references against the original publications".to_string(),
            );
        }
        suggestions
    }
}

#[async_trait]
impl Validator for CitationValidator {
    fn id(&self) -> &str {
        "citations"
    }

    fn name(&self) -> &str {
        "Citation validation"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Citation
    }

    fn algorithm(&self) -> &str {
        "citation-field-doi-check"
    }

    async fn validate(
        &self,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, AnalyzerError> {
        let started = Instant::now();

        if document.citations.is_empty() {
            let issue = ValidationIssue::new(
                IssueType::CitationError,
                IssueCode::CitationMissing,
                Severity::Warning,
                "No citations found",
            )
            .fix("Add a reference list if the document draws on other work", false);

            let mut result = ValidationResult::new(self.id(), self.category(), 100.0, 50.0, vec![issue])
                .fabrication_risk(FabricationRisk::Low);
            result.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
            return Ok(result);
        }

        let style = context.citation_style;
        let mut findings = Findings {
            confidence: 100.0,
            ..Default::default()
        };

        for citation in &document.citations {
            self.check_fields(citation, style, &mut findings);

            let doi_risk = self.check_doi(citation, context, &mut findings).await;
            let record_risk = self.check_crossref(citation, context, &mut findings).await;
            let plausibility_risk = self.check_plausibility(citation, &mut findings);
            findings.risk = findings
                .risk
                .max(doi_risk)
                .max(record_risk)
                .max(plausibility_risk);

            self.check_style(citation, style, &mut findings);
        }
        self.check_duplicates(&document.citations, &mut findings);

        tracing::debug!(
            "Validated {} citations: {} issues, {} inconclusive lookups",
            document.citations.len(),
            findings.issues.len(),
            findings.inconclusive
        );

        let score = penalty_score(&findings.issues, &self.penalties);
        let suggestions = self.suggestions(&findings, style);
        let Findings {
            issues,
            confidence,
            risk,
            inconclusive,
            sources_queried,
            ..
        } = findings;

        let mut result = ValidationResult::new(self.id(), self.category(), score, confidence, issues)
            .passed_at(context.thresholds.citation_accuracy)
            .suggestions(suggestions)
            .fabrication_risk(risk)
            .lookups(sources_queried, inconclusive);
        result.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernorConfig;
    use crate::models::{CitationBuilder, ExternalSources};
    use crate::sources::{MockCitationVerifier, MockDoiResolver};

    fn validator(sources: SourceRegistry) -> CitationValidator {
        CitationValidator::new(
            PenaltyConfig::default(),
            sources,
            Arc::new(ResourceGovernor::default()),
        )
    }

    fn good_citation() -> Citation {
        CitationBuilder::new("ref1", CitationType::Journal)
            .authors("Smith, J.; Doe, A. B.")
            .title("Sleep and memory consolidation")
            .year(2019)
            .journal("Journal of Sleep Research")
            .volume("28")
            .pages("1-12")
            .doi("10.1111/jsr.12345")
            .build()
    }

    fn doc(citations: Vec<Citation>) -> Document {
        Document::new("Body text").with_citations(citations)
    }

    #[tokio::test]
    async fn test_complete_citation_passes() {
        let result = validator(SourceRegistry::new())
            .validate(&doc(vec![good_citation()]), &ValidationContext::default())
            .await
            .unwrap();

        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.confidence, 100.0);
        assert!(result.passed);
        assert_eq!(result.fabrication_risk, Some(FabricationRisk::Low));
    }

    #[tokio::test]
    async fn test_missing_required_field_is_major() {
        let mut citation = good_citation();
        citation.authors.clear();

        let result = validator(SourceRegistry::new())
            .validate(&doc(vec![citation]), &ValidationContext::default())
            .await
            .unwrap();

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].code, IssueCode::CitationMissing);
        assert_eq!(result.issues[0].severity, Severity::Major);
        assert_eq!(result.score, 85.0);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn test_malformed_doi() {
        let mut citation = good_citation();
        citation.doi = Some("11.abc/xyz".to_string());

        let result = validator(SourceRegistry::new())
            .validate(&doc(vec![citation]), &ValidationContext::default())
            .await
            .unwrap();

        assert_eq!(result.issues[0].code, IssueCode::CitationInvalidDoi);
        assert_eq!(result.confidence, 90.0);
        assert_eq!(result.score, 85.0);
    }

    #[tokio::test]
    async fn test_unresolved_doi_through_resolver() {
        let resolver = Arc::new(MockDoiResolver::with_dois(&["10.1000/known"]));
        let sources = SourceRegistry::new().with_doi_resolver(resolver.clone());
        let context = ValidationContext::default().external_sources(ExternalSources {
            doi: true,
            ..Default::default()
        });

        let result = validator(sources)
            .validate(&doc(vec![good_citation()]), &context)
            .await
            .unwrap();

        assert_eq!(resolver.calls(), 1);
        assert_eq!(result.count(Severity::Major), 1);
        assert_eq!(result.issues[0].code, IssueCode::CitationInvalidDoi);
        assert_eq!(result.confidence, 90.0);
        assert_eq!(result.fabrication_risk, Some(FabricationRisk::Medium));
        assert_eq!(result.metadata.sources_queried, vec!["doi".to_string()]);
    }

    #[tokio::test]
    async fn test_resolver_not_called_when_disabled() {
        let resolver = Arc::new(MockDoiResolver::new());
        let sources = SourceRegistry::new().with_doi_resolver(resolver.clone());

        let result = validator(sources)
            .validate(&doc(vec![good_citation()]), &ValidationContext::default())
            .await
            .unwrap();

        assert_eq!(resolver.calls(), 0);
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_rate_limited_lookup_only_costs_confidence() {
        let resolver = Arc::new(MockDoiResolver::with_dois(&["10.1111/jsr.12345"]));
        let sources = SourceRegistry::new().with_doi_resolver(resolver.clone());
        let governor = Arc::new(ResourceGovernor::new(&GovernorConfig {
            default_quota: 0,
            ..GovernorConfig::default()
        }));
        let validator = CitationValidator::new(PenaltyConfig::default(), sources, governor);
        let context = ValidationContext::default().external_sources(ExternalSources::all());

        let result = validator.validate(&doc(vec![good_citation()]), &context).await.unwrap();

        assert_eq!(resolver.calls(), 0);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.confidence, 95.0);
        assert_eq!(result.metadata.inconclusive_lookups, 1);
        assert_eq!(result.issues[0].code, IssueCode::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_unverified_citation_raises_risk() {
        let verifier = Arc::new(MockCitationVerifier::with_titles(&["A different paper"]));
        let sources = SourceRegistry::new().with_citation_verifier(verifier.clone());
        let context = ValidationContext::default().external_sources(ExternalSources {
            crossref: true,
            ..Default::default()
        });

        let result = validator(sources)
            .validate(&doc(vec![good_citation()]), &context)
            .await
            .unwrap();

        assert_eq!(verifier.calls(), 1);
        assert_eq!(result.issues[0].code, IssueCode::CitationUnverified);
        assert_eq!(result.issues[0].severity, Severity::Minor);
        assert_eq!(result.score, 95.0);
        assert_eq!(result.fabrication_risk, Some(FabricationRisk::Medium));
    }

    #[tokio::test]
    async fn test_placeholder_author_and_future_year() {
        let mut citation = good_citation();
        citation.authors = "Lorem Ipsum".to_string();
        citation.year = Some(chrono::Utc::now().year() + 3);

        let result = validator(SourceRegistry::new())
            .validate(&doc(vec![citation]), &ValidationContext::default())
            .await
            .unwrap();

        assert_eq!(result.fabrication_risk, Some(FabricationRisk::High));
        assert!(result.issues.iter().all(|i| i.code == IssueCode::InvalidValue));
        assert_eq!(result.issues.len(), 2);
    }

    #[tokio::test]
    async fn test_apa_author_format_is_auto_fixable() {
        let mut citation = good_citation();
        citation.authors = "John Quincy Smith".to_string();

        let result = validator(SourceRegistry::new())
            .validate(&doc(vec![citation]), &ValidationContext::default())
            .await
            .unwrap();

        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.code, IssueCode::StyleViolation);
        assert_eq!(issue.severity, Severity::Minor);
        assert!(issue.auto_fixable);
        assert_eq!(issue.suggested_fix.as_deref(), Some("Smith, J. Q."));
    }

    #[tokio::test]
    async fn test_mla_hints_full_names() {
        let context = ValidationContext::default().citation_style(CitationStyle::Mla);

        let result = validator(SourceRegistry::new())
            .validate(&doc(vec![good_citation()]), &context)
            .await
            .unwrap();

        assert_eq!(result.issues.len(), 2);
        assert!(result
            .issues
            .iter()
            .all(|i| i.code == IssueCode::StyleViolation && i.severity == Severity::Warning));
    }

    #[tokio::test]
    async fn test_duplicate_titles() {
        let mut second = good_citation();
        second.id = "ref2".to_string();
        second.title = Some("Sleep and Memory Consolidation.".to_string());

        let result = validator(SourceRegistry::new())
            .validate(&doc(vec![good_citation(), second]), &ValidationContext::default())
            .await
            .unwrap();

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].code, IssueCode::DuplicateCitation);
        assert_eq!(result.issues[0].location.section.as_deref(), Some("ref2"));
    }

    #[tokio::test]
    async fn test_no_citations() {
        let result = validator(SourceRegistry::new())
            .validate(&doc(vec![]), &ValidationContext::default())
            .await
            .unwrap();

        assert_eq!(result.score, 100.0);
        assert_eq!(result.confidence, 50.0);
        assert_eq!(result.count(Severity::Warning), 1);
        assert!(result.passed);
    }

    #[test]
    fn test_apa_author_rewrite() {
        assert_eq!(apa_author("Jane Doe").as_deref(), Some("Doe, J."));
        assert_eq!(apa_author("Doe, Jane Mary").as_deref(), Some("Doe, J. M."));
        assert_eq!(apa_author("Doe"), None);
        assert!(apa_author_regex().is_match("Doe, J. M."));
        assert!(!apa_author_regex().is_match("Jane Doe"));
    }

    #[test]
    fn test_suspicious_authors() {
        assert!(is_suspicious_author("et al.", true));
        assert!(!is_suspicious_author("et al", false));
        assert!(is_suspicious_author("Anonymous", false));
        assert!(is_suspicious_author("Author1", false));
        assert!(is_suspicious_author("X", false));
        assert!(!is_suspicious_author("Smith, J.", false));
    }
}
