//! Plagiarism detection by segment fingerprinting.
//!
//! The document is cut into consecutive windows of `segment_words` words.
//! Each window is fingerprinted with word shingles and compared against the
//! local index and, when the context allows it, the remote plagiarism index.
//! Similarities below the match threshold are treated as no match.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::{word_spans, AnalyzerError, Validator};
use crate::config::PlagiarismConfig;
use crate::governor::{ExternalOutcome, ResourceGovernor};
use crate::models::{
    clamp_score, Document, IssueCode, IssueLocation, IssueType, RuleCategory, Severity,
    ValidationContext, ValidationIssue, ValidationResult,
};
use crate::sources::fingerprint::normalize_words;
use crate::sources::{KnownSourceIndex, SegmentFingerprint, SourceMatch, SourceRegistry};

/// A segment with at least one match above the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMatch {
    /// 1-based segment number
    pub segment: usize,
    pub char_start: usize,
    pub char_end: usize,
    pub word_count: usize,

    /// Best similarity found, in [0, 100]
    pub similarity: f64,

    /// Matches above the threshold, best first
    pub matches: Vec<SourceMatch>,
}

/// Detailed outcome of a plagiarism scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismReport {
    /// 100 minus the word-weighted mean of segment similarities
    pub originality_score: f64,

    /// Share of segments that matched, in [0, 100]
    pub overall_similarity: f64,

    pub total_segments: usize,
    pub matched_segments: Vec<SegmentMatch>,

    /// Remote lookups that gave no answer
    pub inconclusive_lookups: usize,

    pub sources_queried: Vec<String>,
}

#[derive(Debug)]
struct Segment {
    start: usize,
    end: usize,
    word_count: usize,
}

/// Detects text copied from known sources
#[derive(Debug, Clone)]
pub struct PlagiarismDetector {
    config: PlagiarismConfig,
    sources: SourceRegistry,
    governor: Arc<ResourceGovernor>,
}

impl PlagiarismDetector {
    pub fn new(config: PlagiarismConfig, sources: SourceRegistry, governor: Arc<ResourceGovernor>) -> Self {
        Self {
            config,
            sources,
            governor,
        }
    }

    fn segments(&self, content: &str) -> Vec<Segment> {
        word_spans(content)
            .chunks(self.config.segment_words.max(1))
            .map(|chunk| Segment {
                start: chunk[0].0,
                end: chunk[chunk.len() - 1].1,
                word_count: chunk.len(),
            })
            .collect()
    }

    /// Scan `content` against the known sources
    pub async fn analyze(&self, content: &str, context: &ValidationContext) -> PlagiarismReport {
        let segments = self.segments(content);
        let remote = if context.external_sources.plagiarism_index {
            self.sources.plagiarism_index().cloned()
        } else {
            None
        };

        let mut sources_queried = vec![self.sources.local_index().id().to_string()];
        if let Some(index) = &remote {
            sources_queried.push(index.id().to_string());
        }

        let mut matched_segments = Vec::new();
        let mut inconclusive = 0;
        let mut weighted_similarity = 0.0;
        let mut total_words = 0;

        for (i, segment) in segments.iter().enumerate() {
            let text = &content[segment.start..segment.end];
            let fingerprint = SegmentFingerprint::of(text, self.config.shingle_size);
            let mut matches = self.sources.local_index().search(&fingerprint);

            if let Some(index) = &remote {
                let source_id = index.id().to_string();
                let key = format!("{}:{}", source_id, normalize_words(text).join(" "));
                let index = Arc::clone(index);
                let lookup_fp = fingerprint.clone();

                match self
                    .governor
                    .guarded_call(&source_id, &key, || async move { index.lookup(&lookup_fp).await })
                    .await
                {
                    ExternalOutcome::Resolved(found) => matches.extend(found),
                    outcome => {
                        tracing::debug!("Plagiarism lookup for segment {}: {}", i + 1, outcome.label());
                        inconclusive += 1;
                    }
                }
            }

            matches.retain(|m| m.similarity >= self.config.match_threshold);
            matches.sort_by(|a, b| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.source_id.cmp(&b.source_id))
            });

            total_words += segment.word_count;
            if let Some(best) = matches.first().map(|m| clamp_score(m.similarity)) {
                weighted_similarity += best * segment.word_count as f64;
                matched_segments.push(SegmentMatch {
                    segment: i + 1,
                    char_start: segment.start,
                    char_end: segment.end,
                    word_count: segment.word_count,
                    similarity: best,
                    matches,
                });
            }
        }

        let (originality_score, overall_similarity) = if segments.is_empty() {
            (100.0, 0.0)
        } else {
            (
                clamp_score(100.0 - weighted_similarity / total_words as f64),
                matched_segments.len() as f64 / segments.len() as f64 * 100.0,
            )
        };

        PlagiarismReport {
            originality_score,
            overall_similarity,
            total_segments: segments.len(),
            matched_segments,
            inconclusive_lookups: inconclusive,
            sources_queried,
        }
    }

    /// Originality against the local index only, without any lookups
    pub fn local_originality(&self, content: &str) -> f64 {
        let segments = self.segments(content);
        if segments.is_empty() {
            return 100.0;
        }

        let mut weighted_similarity = 0.0;
        let mut total_words = 0;
        for segment in &segments {
            let fingerprint = SegmentFingerprint::of(&content[segment.start..segment.end], self.config.shingle_size);
            let best = self
                .sources
                .local_index()
                .search(&fingerprint)
                .into_iter()
                .map(|m| m.similarity)
                .filter(|s| *s >= self.config.match_threshold)
                .fold(0.0, f64::max);
            weighted_similarity += clamp_score(best) * segment.word_count as f64;
            total_words += segment.word_count;
        }
        clamp_score(100.0 - weighted_similarity / total_words as f64)
    }

    fn issue_for(&self, content: &str, m: &SegmentMatch) -> ValidationIssue {
        let severity = if m.similarity > self.config.high_similarity_threshold {
            Severity::Critical
        } else {
            Severity::Major
        };

        let best = &m.matches[0];
        let label = best.title.as_deref().unwrap_or(&best.source_id);
        let excerpt: String = content[m.char_start..m.char_end].chars().take(120).collect();

        let mut issue = ValidationIssue::new(
            IssueType::Plagiarism,
            IssueCode::PlagiarismMatch,
            severity,
            format!(
                "Segment {} is {:.0}% similar to known source '{}'",
                m.segment, m.similarity, label
            ),
        )
        .at(IssueLocation::span(m.char_start, m.char_end))
        .evidence(excerpt)
        .fix(
            format!("Rewrite the passage in your own words or quote and cite '{}'", label),
            false,
        );

        for other in &m.matches {
            issue = issue.evidence(format!("{} ({:.0}%)", other.source_id, other.similarity));
        }
        issue
    }
}

#[async_trait]
impl Validator for PlagiarismDetector {
    fn id(&self) -> &str {
        "plagiarism"
    }

    fn name(&self) -> &str {
        "Plagiarism detection"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Plagiarism
    }

    fn algorithm(&self) -> &str {
        "shingle-jaccard"
    }

    async fn validate(
        &self,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, AnalyzerError> {
        let started = Instant::now();
        let report = self.analyze(&document.content, context).await;

        let issues: Vec<_> = report
            .matched_segments
            .iter()
            .map(|m| self.issue_for(&document.content, m))
            .collect();

        let mut suggestions = Vec::new();
        if !issues.is_empty() {
            suggestions.push(format!(
                "{} of {} segments overlap known sources; review and attribute them",
                report.matched_segments.len(),
                report.total_segments
            ));
        }

        let confidence = 100.0 - 5.0 * report.inconclusive_lookups as f64;
        let mut result = ValidationResult::new(
            self.id(),
            self.category(),
            report.originality_score,
            confidence,
            issues,
        )
        .passed_at(context.thresholds.originality)
        .suggestions(suggestions)
        .lookups(report.sources_queried, report.inconclusive_lookups);
        result.metadata.processing_time_ms = started.elapsed().as_millis() as u64;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExternalSources;
    use crate::sources::{InMemoryIndex, MockSourceIndex};
    use crate::sources::mock::MockBehavior;

    const SOURCE_TEXT: &str = "Photosynthesis converts light energy into chemical energy stored in glucose. \
        Chlorophyll absorbs mostly blue and red wavelengths while reflecting green light. \
        The light dependent reactions take place in the thylakoid membranes and produce ATP and NADPH. \
        The Calvin cycle then fixes carbon dioxide into three carbon sugars inside the stroma. \
        Together these stages sustain nearly all life on Earth by supplying oxygen and organic carbon.";

    fn detector_with(index: InMemoryIndex, remote: Option<Arc<MockSourceIndex>>) -> PlagiarismDetector {
        let mut sources = SourceRegistry::new().with_local_index(Arc::new(index));
        if let Some(remote) = remote {
            sources = sources.with_plagiarism_index(remote);
        }
        let config = PlagiarismConfig {
            segment_words: 20,
            ..PlagiarismConfig::default()
        };
        PlagiarismDetector::new(config, sources, Arc::new(ResourceGovernor::default()))
    }

    fn indexed() -> InMemoryIndex {
        let index = InMemoryIndex::new(20, 5);
        index.add_source("bio-textbook", Some("Biology Textbook".to_string()), SOURCE_TEXT);
        index
    }

    #[tokio::test]
    async fn test_identical_document_has_zero_originality() {
        let detector = detector_with(indexed(), None);
        let document = Document::new(SOURCE_TEXT);

        let result = detector
            .validate(&document, &ValidationContext::default())
            .await
            .unwrap();

        assert!(result.score < 1.0, "originality was {}", result.score);
        assert!(!result.passed);
        assert!(result.count(Severity::Critical) >= 1);
        assert!(result
            .issues
            .iter()
            .all(|i| i.issue_type == IssueType::Plagiarism && i.code == IssueCode::PlagiarismMatch));
    }

    #[tokio::test]
    async fn test_original_document_scores_full() {
        let detector = detector_with(indexed(), None);
        let document = Document::new(
            "Volcanic soils retain water differently from sandy soils because of their porous \
             structure and high mineral content, which matters for terrace farming in the Andes.",
        );

        let report = detector.analyze(&document.content, &ValidationContext::default()).await;
        assert_eq!(report.originality_score, 100.0);
        assert_eq!(report.overall_similarity, 0.0);
        assert!(report.matched_segments.is_empty());
    }

    #[tokio::test]
    async fn test_partial_copy_is_weighted_by_words() {
        let detector = detector_with(indexed(), None);
        let copied: Vec<&str> = SOURCE_TEXT.split_whitespace().take(20).collect();
        let content = format!(
            "{} Meanwhile migratory birds navigate using magnetic cues, star patterns, \
             landmarks and even smell across entire continents every autumn season.",
            copied.join(" ")
        );

        let report = detector.analyze(&content, &ValidationContext::default()).await;
        assert_eq!(report.total_segments, 2);
        assert_eq!(report.matched_segments.len(), 1);
        assert_eq!(report.overall_similarity, 50.0);
        assert!(report.originality_score > 40.0 && report.originality_score < 60.0);
    }

    #[test]
    fn test_local_originality() {
        let detector = detector_with(indexed(), None);
        assert!(detector.local_originality(SOURCE_TEXT) < 1.0);
        assert_eq!(detector.local_originality(""), 100.0);
        assert_eq!(
            detector.local_originality("Glaciers carve valleys slowly over thousands of years."),
            100.0
        );
    }

    #[tokio::test]
    async fn test_empty_document() {
        let detector = detector_with(indexed(), None);
        let result = detector
            .validate(&Document::new("   "), &ValidationContext::default())
            .await
            .unwrap();
        assert_eq!(result.score, 100.0);
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn test_remote_index_only_when_enabled() {
        let remote = Arc::new(MockSourceIndex::new());
        remote.set_matches(vec![SourceMatch {
            source_id: "remote-essay".to_string(),
            title: None,
            similarity: 60.0,
            confidence: 90.0,
        }]);
        let detector = detector_with(InMemoryIndex::default(), Some(Arc::clone(&remote)));
        let document = Document::new("A short original paragraph about tidal energy.");

        let report = detector.analyze(&document.content, &ValidationContext::default()).await;
        assert!(report.matched_segments.is_empty());
        assert_eq!(remote.calls(), 0);

        let context = ValidationContext::default().external_sources(ExternalSources::all());
        let result = detector.validate(&document, &context).await.unwrap();
        assert_eq!(remote.calls(), 1);
        assert_eq!(result.count(Severity::Major), 1);
        assert!((result.score - 40.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_remote_failure_lowers_confidence_only() {
        let remote = Arc::new(MockSourceIndex::new());
        remote.set_behavior(MockBehavior::Fail);
        let detector = detector_with(InMemoryIndex::default(), Some(remote));
        let context = ValidationContext::default().external_sources(ExternalSources::all());

        let result = detector
            .validate(&Document::new("Entirely original words about tidal energy."), &context)
            .await
            .unwrap();

        assert_eq!(result.score, 100.0);
        assert_eq!(result.confidence, 95.0);
        assert_eq!(result.metadata.inconclusive_lookups, 1);
    }
}
