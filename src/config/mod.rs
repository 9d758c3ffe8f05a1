//! Configuration management.
//!
//! Configuration is read from a TOML file, with environment variable overrides
//! using the `RESEARCH_INTEGRITY` prefix and `__` as the section separator
//! (e.g. `RESEARCH_INTEGRITY_SCORING__PASS_THRESHOLD=75`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [governor]
//! default_quota = 30
//! default_window_secs = 60
//! failure_threshold = 5
//! cooldown_secs = 60
//! cache_ttl_secs = 3600
//! call_timeout_ms = 5000
//!
//! [[governor.source_limits]]
//! source = "crossref"
//! quota = 10
//! window_secs = 60
//!
//! [scoring]
//! pass_threshold = 70.0
//! rule_timeout_secs = 60
//!
//! [scoring.penalties]
//! critical = 25.0
//! major = 15.0
//! minor = 5.0
//! warning = 2.0
//!
//! [plagiarism]
//! segment_words = 50
//! shingle_size = 5
//!
//! [sources]
//! known_sources_dir = "/srv/known-texts"
//!
//! [[rules]]
//! id = "methodology"
//! enabled = false
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Severity;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rate limiting, circuit breaking and caching of external calls
    #[serde(default)]
    pub governor: GovernorConfig,

    /// Scoring penalties and thresholds
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Plagiarism detection tuning
    #[serde(default)]
    pub plagiarism: PlagiarismConfig,

    /// Format checks
    #[serde(default)]
    pub format: FormatConfig,

    /// External service endpoints
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Per-rule overrides
    #[serde(default)]
    pub rules: Vec<RuleOverride>,

    /// Logging section
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resource governor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Calls allowed per window for sources without an override
    #[serde(default = "default_quota")]
    pub default_quota: u32,

    /// Window length in seconds for sources without an override
    #[serde(default = "default_window_secs")]
    pub default_window_secs: u64,

    /// Per-source rate limits
    #[serde(default)]
    pub source_limits: Vec<SourceLimitConfig>,

    /// Consecutive failures before a circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds an open circuit waits before allowing a probe
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// TTL for cached lookup results
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Timeout for each external call
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            default_quota: default_quota(),
            default_window_secs: default_window_secs(),
            source_limits: Vec::new(),
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

impl GovernorConfig {
    /// Quota and window for a source, honoring overrides
    pub fn limit_for(&self, source: &str) -> (u32, u64) {
        self.source_limits
            .iter()
            .find(|l| l.source == source)
            .map(|l| (l.quota, l.window_secs))
            .unwrap_or((self.default_quota, self.default_window_secs))
    }
}

fn default_quota() -> u32 {
    30
}

fn default_window_secs() -> u64 {
    60
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_cache_ttl_secs() -> u64 {
    3600 // 1 hour
}

fn default_call_timeout_ms() -> u64 {
    5000
}

/// Per-source rate limit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLimitConfig {
    pub source: String,
    pub quota: u32,
    pub window_secs: u64,
}

/// Points deducted from a rule score per issue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    #[serde(default = "default_critical_penalty")]
    pub critical: f64,

    #[serde(default = "default_major_penalty")]
    pub major: f64,

    #[serde(default = "default_minor_penalty")]
    pub minor: f64,

    #[serde(default = "default_warning_penalty")]
    pub warning: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            critical: default_critical_penalty(),
            major: default_major_penalty(),
            minor: default_minor_penalty(),
            warning: default_warning_penalty(),
        }
    }
}

impl PenaltyConfig {
    /// Penalty for one issue of the given severity
    pub fn for_severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Major => self.major,
            Severity::Minor => self.minor,
            Severity::Warning => self.warning,
        }
    }
}

fn default_critical_penalty() -> f64 {
    25.0
}

fn default_major_penalty() -> f64 {
    15.0
}

fn default_minor_penalty() -> f64 {
    5.0
}

fn default_warning_penalty() -> f64 {
    2.0
}

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum overall score for a report to pass
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,

    /// Per-issue penalties
    #[serde(default)]
    pub penalties: PenaltyConfig,

    /// Upper bound on a single rule's run time
    #[serde(default = "default_rule_timeout_secs")]
    pub rule_timeout_secs: u64,

    /// Terminal checks kept in memory for polling
    #[serde(default = "default_max_retained_checks")]
    pub max_retained_checks: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pass_threshold: default_pass_threshold(),
            penalties: PenaltyConfig::default(),
            rule_timeout_secs: default_rule_timeout_secs(),
            max_retained_checks: default_max_retained_checks(),
        }
    }
}

fn default_pass_threshold() -> f64 {
    70.0
}

fn default_rule_timeout_secs() -> u64 {
    60
}

fn default_max_retained_checks() -> usize {
    1000
}

/// Plagiarism detection configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismConfig {
    /// Words per segment
    #[serde(default = "default_segment_words")]
    pub segment_words: usize,

    /// Words per shingle
    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,

    /// Similarity (percent) below which a match is ignored
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Similarity (percent) above which a match is critical
    #[serde(default = "default_high_similarity")]
    pub high_similarity_threshold: f64,
}

impl Default for PlagiarismConfig {
    fn default() -> Self {
        Self {
            segment_words: default_segment_words(),
            shingle_size: default_shingle_size(),
            match_threshold: default_match_threshold(),
            high_similarity_threshold: default_high_similarity(),
        }
    }
}

fn default_segment_words() -> usize {
    50
}

fn default_shingle_size() -> usize {
    5
}

fn default_match_threshold() -> f64 {
    30.0
}

fn default_high_similarity() -> f64 {
    80.0
}

/// Format check configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Paragraphs longer than this are flagged
    #[serde(default = "default_max_paragraph_words")]
    pub max_paragraph_words: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            max_paragraph_words: default_max_paragraph_words(),
        }
    }
}

fn default_max_paragraph_words() -> usize {
    400
}

/// External service endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// DOI resolver base URL
    #[serde(default = "default_doi_resolver_url")]
    pub doi_resolver_url: String,

    /// CrossRef API base URL
    #[serde(default = "default_crossref_api_url")]
    pub crossref_api_url: String,

    /// Contact address for CrossRef's polite pool
    #[serde(default)]
    pub mailto: Option<String>,

    /// Directory of `.txt`/`.md` known texts loaded into the local index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_sources_dir: Option<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            doi_resolver_url: default_doi_resolver_url(),
            crossref_api_url: default_crossref_api_url(),
            mailto: std::env::var("RESEARCH_INTEGRITY_MAILTO").ok(),
            known_sources_dir: None,
        }
    }
}

fn default_doi_resolver_url() -> String {
    "https://doi.org".to_string()
}

fn default_crossref_api_url() -> String {
    "https://api.crossref.org".to_string()
}

/// Override for one built-in rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOverride {
    pub id: String,

    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub weight: Option<f64>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "json" for structured output, anything else for human-readable
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Check values are within their meaningful ranges
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        let mut problems = Vec::new();

        if !(0.0..=100.0).contains(&self.scoring.pass_threshold) {
            problems.push("scoring.pass_threshold must be within 0-100".to_string());
        }
        let p = &self.scoring.penalties;
        if [p.critical, p.major, p.minor, p.warning]
            .iter()
            .any(|v| *v < 0.0)
        {
            problems.push("scoring.penalties must not be negative".to_string());
        }
        if self.governor.default_quota == 0 {
            problems.push("governor.default_quota must be positive".to_string());
        }
        if self.governor.failure_threshold == 0 {
            problems.push("governor.failure_threshold must be positive".to_string());
        }
        if self.plagiarism.segment_words == 0 || self.plagiarism.shingle_size == 0 {
            problems.push("plagiarism segment and shingle sizes must be positive".to_string());
        }
        for rule in &self.rules {
            if let Some(weight) = rule.weight {
                if !(0.0..=1.0).contains(&weight) {
                    problems.push(format!("rules.{}.weight must be within 0-1", rule.id));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigFileError::Invalid(problems.join("; ")))
        }
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from a file, applying environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigFileError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("RESEARCH_INTEGRITY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to a TOML file
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigFileError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Find a configuration file in the default locations
///
/// Checks `./research-integrity.toml`, then
/// `<config dir>/research-integrity/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("research-integrity.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("research-integrity").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration
pub fn get_config() -> Config {
    Config::default()
}
