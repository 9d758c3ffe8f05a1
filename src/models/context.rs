//! Validation context: who the document is for and how strictly to judge it.

use serde::{Deserialize, Serialize};

/// Research paradigm of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Paradigm {
    #[default]
    Quantitative,
    Qualitative,
    Mixed,
    Theoretical,
}

/// Citation style the document claims to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    /// APA 7th edition
    #[default]
    Apa,
    /// MLA 9th edition
    Mla,
    /// Chicago 17th edition (author-date)
    Chicago,
    /// IEEE numeric
    Ieee,
    /// Harvard author-date
    Harvard,
}

impl CitationStyle {
    /// Returns the identifier used in schemas and output
    pub fn id(&self) -> &'static str {
        match self {
            CitationStyle::Apa => "apa",
            CitationStyle::Mla => "mla",
            CitationStyle::Chicago => "chicago",
            CitationStyle::Ieee => "ieee",
            CitationStyle::Harvard => "harvard",
        }
    }

    /// Whether in-text citations use author-date markers
    pub fn is_author_date(&self) -> bool {
        matches!(
            self,
            CitationStyle::Apa | CitationStyle::Chicago | CitationStyle::Harvard
        )
    }
}

/// Academic level of the author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AcademicLevel {
    Undergraduate,
    Masters,
    #[default]
    Doctoral,
    Faculty,
}

/// Per-category pass thresholds, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum originality score
    #[serde(default = "default_originality")]
    pub originality: f64,

    /// Minimum citation accuracy score
    #[serde(default = "default_citation_accuracy")]
    pub citation_accuracy: f64,

    /// Minimum data integrity score
    #[serde(default = "default_data_integrity")]
    pub data_integrity: f64,

    /// Minimum methodology rigor score
    #[serde(default = "default_methodology_rigor")]
    pub methodology_rigor: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            originality: default_originality(),
            citation_accuracy: default_citation_accuracy(),
            data_integrity: default_data_integrity(),
            methodology_rigor: default_methodology_rigor(),
        }
    }
}

fn default_originality() -> f64 {
    85.0
}

fn default_citation_accuracy() -> f64 {
    90.0
}

fn default_data_integrity() -> f64 {
    95.0
}

fn default_methodology_rigor() -> f64 {
    80.0
}

/// External services a check is allowed to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExternalSources {
    /// Resolve DOIs against the DOI registry
    #[serde(default)]
    pub doi: bool,

    /// Cross-reference citations against a bibliographic service
    #[serde(default)]
    pub crossref: bool,

    /// Query the remote known-source plagiarism index
    #[serde(default)]
    pub plagiarism_index: bool,
}

impl ExternalSources {
    /// Allow every external source
    pub fn all() -> Self {
        Self {
            doi: true,
            crossref: true,
            plagiarism_index: true,
        }
    }
}

/// Context for one integrity check; immutable while the check runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationContext {
    /// Identifier of the document being checked
    pub document_id: String,

    /// Academic discipline (e.g., "psychology")
    #[serde(default)]
    pub discipline: String,

    /// Research paradigm
    #[serde(default)]
    pub paradigm: Paradigm,

    /// Citation style
    #[serde(default)]
    pub citation_style: CitationStyle,

    /// Academic level
    #[serde(default)]
    pub academic_level: AcademicLevel,

    /// Per-category pass thresholds
    #[serde(default)]
    pub thresholds: Thresholds,

    /// External sources that may be queried
    #[serde(default)]
    pub external_sources: ExternalSources,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            document_id: "document".to_string(),
            discipline: String::new(),
            paradigm: Paradigm::default(),
            citation_style: CitationStyle::default(),
            academic_level: AcademicLevel::default(),
            thresholds: Thresholds::default(),
            external_sources: ExternalSources::default(),
        }
    }
}

impl ValidationContext {
    /// Create a new context for a document
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Default::default()
        }
    }

    /// Set discipline
    pub fn discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = discipline.into();
        self
    }

    /// Set paradigm
    pub fn paradigm(mut self, paradigm: Paradigm) -> Self {
        self.paradigm = paradigm;
        self
    }

    /// Set citation style
    pub fn citation_style(mut self, style: CitationStyle) -> Self {
        self.citation_style = style;
        self
    }

    /// Set academic level
    pub fn academic_level(mut self, level: AcademicLevel) -> Self {
        self.academic_level = level;
        self
    }

    /// Set thresholds
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set external source flags
    pub fn external_sources(mut self, sources: ExternalSources) -> Self {
        self.external_sources = sources;
        self
    }

    /// Check the context is structurally usable, returning every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.document_id.trim().is_empty() {
            problems.push("document_id must not be empty".to_string());
        }

        let thresholds = [
            ("originality", self.thresholds.originality),
            ("citation_accuracy", self.thresholds.citation_accuracy),
            ("data_integrity", self.thresholds.data_integrity),
            ("methodology_rigor", self.thresholds.methodology_rigor),
        ];
        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                problems.push(format!(
                    "threshold '{}' must be within 0-100, got {}",
                    name, value
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = ValidationContext::new("doc-1")
            .discipline("biology")
            .paradigm(Paradigm::Qualitative)
            .citation_style(CitationStyle::Ieee)
            .external_sources(ExternalSources::all());

        assert_eq!(ctx.document_id, "doc-1");
        assert_eq!(ctx.paradigm, Paradigm::Qualitative);
        assert!(ctx.external_sources.doi);
        assert!(!ctx.citation_style.is_author_date());
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn test_context_validate_rejects_bad_thresholds() {
        let mut ctx = ValidationContext::new(" ");
        ctx.thresholds.originality = 120.0;

        let problems = ctx.validate().unwrap_err();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_context_deserialize_minimal() {
        let ctx: ValidationContext =
            serde_json::from_str(r#"{"document_id": "x", "citation_style": "mla"}"#).unwrap();
        assert_eq!(ctx.citation_style, CitationStyle::Mla);
        assert_eq!(ctx.thresholds.originality, 85.0);
        assert!(!ctx.external_sources.doi);
    }
}
