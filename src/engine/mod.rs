//! The integrity engine: the public API over rules, checks and reports.
//!
//! [`IntegrityEngine`] owns the rule registry, the resource governor and the
//! orchestrator. Full checks are submitted and polled by id; the single-rule
//! operations (`detect_plagiarism`, `validate_citations`,
//! `validate_data_consistency`) run one rule inline and return its result.

pub mod aggregator;
pub mod export;
pub mod observer;
pub mod orchestrator;

pub use aggregator::{ReportAggregator, WeightedResult};
pub use export::{export_check, ExportedReport, ReportFormat};
pub use observer::{EventBus, IntegrityEvent, IntegrityObserver, TracingObserver};
pub use orchestrator::{CheckStore, ValidationOrchestrator};

use std::sync::Arc;
use std::time::Duration;

use crate::analyzers::{
    author_date_markers, author_page_markers, numeric_markers, paragraphs, word_spans,
    PlagiarismDetector,
};
use crate::config::{Config, ConfigFileError};
use crate::governor::{GovernorStatus, InputError, ResourceGovernor};
use crate::models::{
    Citation, CheckStatus, CheckType, Document, FieldCheck, IntegrityCheck, QuickScore, RiskLevel,
    ValidationContext, ValidationResult, clamp_score,
};
use crate::rules::{RuleInfo, RuleRegistry};
use crate::sources::{SourceError, SourceRegistry};

/// Documents shorter than this get a quick-score penalty
const QUICK_MIN_WORDS: usize = 100;

/// Errors surfaced by the engine API
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error("Invalid input: {}", join_input_errors(.0))]
    InvalidInput(Vec<InputError>),

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("Check not found: {0}")]
    CheckNotFound(String),

    #[error("Check {0} has not finished yet")]
    CheckNotReady(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: CheckStatus, to: CheckStatus },

    #[error("No enabled rules for this check")]
    NoEnabledRules,

    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

fn join_input_errors(errors: &[InputError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<InputError>> for IntegrityError {
    fn from(errors: Vec<InputError>) -> Self {
        IntegrityError::InvalidInput(errors)
    }
}

/// Academic integrity validation engine
#[derive(Debug)]
pub struct IntegrityEngine {
    config: Config,
    governor: Arc<ResourceGovernor>,
    rules: Arc<RuleRegistry>,
    orchestrator: ValidationOrchestrator,
    quick_detector: PlagiarismDetector,
    sources: SourceRegistry,
}

impl IntegrityEngine {
    /// Create an engine with the HTTP collaborators described by `config`
    pub fn new(config: Config) -> Result<Self, IntegrityError> {
        config.validate()?;
        let sources = SourceRegistry::from_config(&config)?;
        Ok(Self::with_sources(config, sources))
    }

    /// Create an engine with explicitly provided collaborators
    ///
    /// The local index is re-windowed to the configured segment and shingle
    /// sizes so copied segments line up with indexed windows.
    pub fn with_sources(config: Config, sources: SourceRegistry) -> Self {
        sources
            .local_index()
            .reconfigure(config.plagiarism.segment_words, config.plagiarism.shingle_size);
        let governor = Arc::new(ResourceGovernor::new(&config.governor));
        let rules = Arc::new(RuleRegistry::with_defaults(
            &config,
            sources.clone(),
            Arc::clone(&governor),
        ));
        let orchestrator = ValidationOrchestrator::new(
            Arc::clone(&rules),
            ReportAggregator::new(config.scoring.pass_threshold),
            Duration::from_secs(config.scoring.rule_timeout_secs),
            config.scoring.max_retained_checks,
        );
        orchestrator.events().add_observer(Arc::new(TracingObserver));

        let quick_detector =
            PlagiarismDetector::new(config.plagiarism, sources.clone(), Arc::clone(&governor));

        Self {
            config,
            governor,
            rules,
            orchestrator,
            quick_detector,
            sources,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn governor(&self) -> &Arc<ResourceGovernor> {
        &self.governor
    }

    pub fn rules(&self) -> &Arc<RuleRegistry> {
        &self.rules
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Add a text to the local known-source index
    ///
    /// Applies to plagiarism checks started from now on.
    pub fn add_known_source(
        &self,
        source_id: &str,
        title: Option<String>,
        content: &str,
    ) -> Result<usize, IntegrityError> {
        if source_id.trim().is_empty() {
            return Err(IntegrityError::InvalidInput(vec![InputError::Missing(
                "source_id".to_string(),
            )]));
        }
        let index = self.sources.local_index();
        index.add_source(source_id, title, content);
        Ok(index.len())
    }

    /// Submit a full check and return its id immediately
    ///
    /// Must be called from within a Tokio runtime.
    pub fn validate_document(
        &self,
        document: Document,
        context: ValidationContext,
    ) -> Result<String, IntegrityError> {
        self.submit_check(document, context, CheckType::Full)
    }

    /// Submit a check of the given type and return its id immediately
    pub fn submit_check(
        &self,
        document: Document,
        context: ValidationContext,
        check_type: CheckType,
    ) -> Result<String, IntegrityError> {
        check_context(&context)?;
        Ok(self.orchestrator.submit(document, context, check_type))
    }

    /// Current state of a check
    pub fn get_integrity_results(&self, check_id: &str) -> Result<IntegrityCheck, IntegrityError> {
        self.orchestrator
            .store()
            .get(check_id)
            .ok_or_else(|| IntegrityError::CheckNotFound(check_id.to_string()))
    }

    /// Wait until a check completes or fails
    pub async fn wait_for_completion(&self, check_id: &str) -> Result<IntegrityCheck, IntegrityError> {
        self.orchestrator.wait_for(check_id).await
    }

    /// Run the plagiarism rule on `content`
    pub async fn detect_plagiarism(
        &self,
        content: &str,
        context: &ValidationContext,
    ) -> Result<ValidationResult, IntegrityError> {
        self.run_rule("plagiarism", &Document::new(content), context).await
    }

    /// Run the citation rule on a reference list
    pub async fn validate_citations(
        &self,
        citations: Vec<Citation>,
        context: &ValidationContext,
    ) -> Result<ValidationResult, IntegrityError> {
        let document = Document::default().with_citations(citations);
        self.run_rule("citations", &document, context).await
    }

    /// Run the data consistency rule on a record and its schema
    pub async fn validate_data_consistency(
        &self,
        data: serde_json::Map<String, serde_json::Value>,
        schema: Vec<FieldCheck>,
        context: &ValidationContext,
    ) -> Result<ValidationResult, IntegrityError> {
        let document = Document::default().with_data(data, schema);
        self.run_rule("data_consistency", &document, context).await
    }

    /// Evaluate one rule inline, regardless of whether it is enabled
    async fn run_rule(
        &self,
        rule_id: &str,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, IntegrityError> {
        check_context(context)?;
        let rule = self
            .rules
            .get(rule_id)
            .ok_or_else(|| IntegrityError::UnknownRule(rule_id.to_string()))?;

        match rule.evaluate(document, context).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!("Rule {} failed: {}", rule_id, e);
                let mut result = ValidationResult::failed(&rule.id, rule.category, &e.to_string());
                crate::analyzers::assign_issue_ids(&rule.id, &mut result.issues);
                Ok(result)
            }
        }
    }

    /// Cheap synchronous estimate using only local checks
    pub fn get_quick_integrity_score(&self, content: &str) -> QuickScore {
        let mut quick_issues = Vec::new();
        let words = word_spans(content).len();

        if words == 0 {
            return QuickScore {
                score: 0.0,
                risk_level: RiskLevel::High,
                quick_issues: vec!["Document has no content".to_string()],
            };
        }

        let originality = self.quick_detector.local_originality(content);
        let mut score = originality;
        if originality < 100.0 {
            quick_issues.push(format!(
                "Overlaps known sources (originality {:.0}%)",
                originality
            ));
        }

        if words < QUICK_MIN_WORDS {
            score -= 10.0;
            quick_issues.push(format!("Document is very short ({} words)", words));
        }

        let author_date = author_date_markers(content);
        let numeric = numeric_markers(content);
        if author_date.is_empty() && numeric.is_empty() && author_page_markers(content).is_empty() {
            score -= 15.0;
            quick_issues.push("No in-text citations found".to_string());
        } else if !author_date.is_empty() && !numeric.is_empty() {
            score -= 10.0;
            quick_issues.push("Mixes author-date and numeric in-text citations".to_string());
        }

        let max_words = self.config.format.max_paragraph_words;
        for paragraph in paragraphs(content) {
            if word_spans(paragraph.text).len() > max_words {
                score -= 5.0;
                quick_issues.push(format!(
                    "Paragraph {} is longer than {} words",
                    paragraph.index, max_words
                ));
            }
        }

        let score = clamp_score(score);
        QuickScore {
            score,
            risk_level: RiskLevel::from_score(score),
            quick_issues,
        }
    }

    /// Render a finished check
    pub fn generate_integrity_report(
        &self,
        check_id: &str,
        format: ReportFormat,
    ) -> Result<ExportedReport, IntegrityError> {
        let check = self.get_integrity_results(check_id)?;
        if !check.status.is_terminal() {
            return Err(IntegrityError::CheckNotReady(check_id.to_string()));
        }
        export_check(&check, format)
    }

    pub fn list_rules(&self) -> Vec<RuleInfo> {
        self.rules.list()
    }

    /// Enable or disable a rule for checks submitted from now on
    pub fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> Result<(), IntegrityError> {
        if self.rules.set_enabled(rule_id, enabled) {
            Ok(())
        } else {
            Err(IntegrityError::UnknownRule(rule_id.to_string()))
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn IntegrityObserver>) {
        self.orchestrator.events().add_observer(observer);
    }

    /// Receive every lifecycle event emitted from now on
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<IntegrityEvent> {
        self.orchestrator.events().subscribe()
    }

    pub fn governor_status(&self) -> GovernorStatus {
        self.governor.status()
    }
}

fn check_context(context: &ValidationContext) -> Result<(), IntegrityError> {
    context
        .validate()
        .map_err(|problems| IntegrityError::InvalidContext(problems.join("; ")))
}
