//! Turning per-rule results into a report.

use chrono::Utc;
use std::collections::BTreeMap;

use crate::models::{
    clamp_score, CategoryScores, FabricationRisk, IntegrityReport, RuleCategory, Severity,
    ValidationContext, ValidationResult,
};

/// Format scores below this get a recommendation
const FORMAT_RECOMMENDATION_THRESHOLD: f64 = 80.0;

/// Plagiarism scores below this get a recommendation
const PLAGIARISM_RECOMMENDATION_THRESHOLD: f64 = 80.0;

/// A rule's result with the weight it counts for
#[derive(Debug, Clone)]
pub struct WeightedResult {
    pub result: ValidationResult,
    pub weight: f64,
}

/// Combines rule results into an [`IntegrityReport`]
///
/// Aggregation is independent of the order results arrive in.
#[derive(Debug, Clone, Copy)]
pub struct ReportAggregator {
    pass_threshold: f64,
}

impl Default for ReportAggregator {
    fn default() -> Self {
        Self::new(70.0)
    }
}

impl ReportAggregator {
    pub fn new(pass_threshold: f64) -> Self {
        Self { pass_threshold }
    }

    pub fn aggregate(
        &self,
        mut results: Vec<WeightedResult>,
        context: &ValidationContext,
        processing_time_ms: u64,
    ) -> IntegrityReport {
        results.sort_by(|a, b| a.result.rule_id.cmp(&b.result.rule_id));

        let mut by_category: BTreeMap<RuleCategory, Vec<f64>> = BTreeMap::new();
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut counts = [0usize; 4];
        let mut fabrication_risk = FabricationRisk::Low;

        for WeightedResult { result, weight } in &results {
            by_category.entry(result.category).or_default().push(result.score);
            weighted += result.score * weight;
            total_weight += weight;
            if let Some(risk) = result.fabrication_risk {
                fabrication_risk = fabrication_risk.max(risk);
            }
            for issue in &result.issues {
                let slot = match issue.severity {
                    Severity::Critical => 0,
                    Severity::Major => 1,
                    Severity::Minor => 2,
                    Severity::Warning => 3,
                };
                counts[slot] += 1;
            }
        }

        let mut category_scores = CategoryScores::default();
        for (category, scores) in &by_category {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            category_scores.set(*category, clamp_score(mean));
        }

        let overall_score = if total_weight > 0.0 {
            clamp_score(weighted / total_weight)
        } else {
            100.0
        };

        let [critical_issues, major_issues, minor_issues, warning_issues] = counts;
        let passed = overall_score >= self.pass_threshold && critical_issues == 0;

        IntegrityReport {
            overall_score,
            category_scores,
            total_issues: counts.iter().sum(),
            critical_issues,
            major_issues,
            minor_issues,
            warning_issues,
            passed,
            fabrication_risk,
            recommendations: recommendations(&category_scores, critical_issues, context),
            results: results.into_iter().map(|w| w.result).collect(),
            generated_at: Utc::now(),
            processing_time_ms,
        }
    }
}

fn recommendations(scores: &CategoryScores, critical_issues: usize, context: &ValidationContext) -> Vec<String> {
    let thresholds = &context.thresholds;
    let mut recs = Vec::new();

    if scores.plagiarism < PLAGIARISM_RECOMMENDATION_THRESHOLD {
        recs.push("Review flagged content and add proper attribution".to_string());
    }
    if scores.citation < thresholds.citation_accuracy {
        recs.push("Correct citation errors".to_string());
    }
    if scores.data < thresholds.data_integrity {
        recs.push("Verify data values".to_string());
    }
    if scores.methodology < thresholds.methodology_rigor {
        recs.push("Strengthen methodology description".to_string());
    }
    if scores.format < FORMAT_RECOMMENDATION_THRESHOLD {
        recs.push("Apply style formatting".to_string());
    }
    if critical_issues > 0 {
        recs.push("Resolve critical issues before submission".to_string());
    }
    if recs.is_empty() {
        recs.push("Document meets integrity standards".to_string());
    }
    recs
}
