//! Document model: the immutable snapshot a check validates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of work a citation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CitationType {
    #[default]
    Journal,
    Book,
    Conference,
    Website,
    Thesis,
    Report,
    Other,
}

impl CitationType {
    /// Returns the identifier used in schemas and output
    pub fn id(&self) -> &'static str {
        match self {
            CitationType::Journal => "journal",
            CitationType::Book => "book",
            CitationType::Conference => "conference",
            CitationType::Website => "website",
            CitationType::Thesis => "thesis",
            CitationType::Report => "report",
            CitationType::Other => "other",
        }
    }
}

impl std::fmt::Display for CitationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A bibliographic reference attached to a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Citation {
    /// Reference identifier within the document (e.g., "ref1")
    #[serde(default)]
    pub id: String,

    /// Kind of work
    #[serde(default, rename = "type")]
    pub citation_type: CitationType,

    /// Authors (semicolon-separated)
    #[serde(default)]
    pub authors: String,

    /// Title of the work
    #[serde(default)]
    pub title: Option<String>,

    /// Publication year
    #[serde(default)]
    pub year: Option<i32>,

    /// Journal or proceedings name
    #[serde(default)]
    pub journal: Option<String>,

    /// Publisher
    #[serde(default)]
    pub publisher: Option<String>,

    /// Volume
    #[serde(default)]
    pub volume: Option<String>,

    /// Issue number
    #[serde(default)]
    pub issue: Option<String>,

    /// Page range
    #[serde(default)]
    pub pages: Option<String>,

    /// Digital Object Identifier
    #[serde(default)]
    pub doi: Option<String>,

    /// Web address
    #[serde(default)]
    pub url: Option<String>,

    /// Access date for web resources
    #[serde(default)]
    pub accessed: Option<String>,

    /// The reference as it appears in the bibliography
    #[serde(default)]
    pub raw: Option<String>,
}

impl Citation {
    /// Returns the author names as a vector
    pub fn author_list(&self) -> Vec<&str> {
        self.authors
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the surname of the first author, if any
    pub fn first_author_surname(&self) -> Option<String> {
        let first = *self.author_list().first()?;
        let surname = match first.split_once(',') {
            Some((last, _)) => last.trim(),
            None => first.split_whitespace().last().unwrap_or(first),
        };
        Some(surname.to_string())
    }

    /// Check whether a named field carries a non-empty value
    pub fn has_field(&self, field: &str) -> bool {
        fn filled(v: &Option<String>) -> bool {
            v.as_deref().is_some_and(|s| !s.trim().is_empty())
        }

        match field {
            "authors" => !self.author_list().is_empty(),
            "title" => filled(&self.title),
            "year" => self.year.is_some(),
            "journal" => filled(&self.journal),
            "publisher" => filled(&self.publisher),
            "volume" => filled(&self.volume),
            "issue" => filled(&self.issue),
            "pages" => filled(&self.pages),
            "doi" => filled(&self.doi),
            "url" => filled(&self.url),
            "accessed" => filled(&self.accessed),
            _ => false,
        }
    }

    /// Label used in issue descriptions
    pub fn label(&self) -> String {
        if !self.id.is_empty() {
            return self.id.clone();
        }
        self.title
            .clone()
            .unwrap_or_else(|| "untitled reference".to_string())
    }
}

/// Builder for constructing Citation objects
#[derive(Debug, Clone)]
pub struct CitationBuilder {
    citation: Citation,
}

impl CitationBuilder {
    /// Create a new builder with the reference id and type
    pub fn new(id: impl Into<String>, citation_type: CitationType) -> Self {
        Self {
            citation: Citation {
                id: id.into(),
                citation_type,
                ..Default::default()
            },
        }
    }

    /// Set authors
    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.citation.authors = authors.into();
        self
    }

    /// Set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.citation.title = Some(title.into());
        self
    }

    /// Set year
    pub fn year(mut self, year: i32) -> Self {
        self.citation.year = Some(year);
        self
    }

    /// Set journal
    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.citation.journal = Some(journal.into());
        self
    }

    /// Set publisher
    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.citation.publisher = Some(publisher.into());
        self
    }

    /// Set volume
    pub fn volume(mut self, volume: impl Into<String>) -> Self {
        self.citation.volume = Some(volume.into());
        self
    }

    /// Set pages
    pub fn pages(mut self, pages: impl Into<String>) -> Self {
        self.citation.pages = Some(pages.into());
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.citation.doi = Some(doi.into());
        self
    }

    /// Set URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.citation.url = Some(url.into());
        self
    }

    /// Set access date
    pub fn accessed(mut self, accessed: impl Into<String>) -> Self {
        self.citation.accessed = Some(accessed.into());
        self
    }

    /// Build the Citation
    pub fn build(self) -> Citation {
        self.citation
    }
}

/// Expected type of a structured data field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Array,
    Object,
}

impl FieldType {
    /// Returns the identifier used in schemas and output
    pub fn id(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

/// Relation required between two fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRelation {
    Equals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl FieldRelation {
    /// Symbol used in issue descriptions
    pub fn symbol(&self) -> &'static str {
        match self {
            FieldRelation::Equals => "==",
            FieldRelation::LessThan => "<",
            FieldRelation::LessOrEqual => "<=",
            FieldRelation::GreaterThan => ">",
            FieldRelation::GreaterOrEqual => ">=",
        }
    }
}

/// Cross-field constraint: `this <relation> other`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    /// Name of the referenced field
    pub field: String,

    /// Relation that must hold
    #[serde(default = "default_relation")]
    pub relation: FieldRelation,
}

fn default_relation() -> FieldRelation {
    FieldRelation::Equals
}

/// Declarative check for one field of a document's structured data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCheck {
    /// Field name in the data record
    pub field: String,

    /// Expected type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether the field must be present
    #[serde(default)]
    pub required: bool,

    /// Regex the string form of the value must match
    #[serde(default)]
    pub pattern: Option<String>,

    /// Allowed values (compared on their JSON form)
    #[serde(default)]
    pub allowed_values: Option<Vec<serde_json::Value>>,

    /// Constraints against other fields
    #[serde(default)]
    pub cross_references: Vec<CrossReference>,
}

impl FieldCheck {
    /// Create a check for an optional field of the given type
    pub fn new(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            required: false,
            pattern: None,
            allowed_values: None,
            cross_references: Vec::new(),
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a regex pattern
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the allowed values
    pub fn allowed(mut self, values: Vec<serde_json::Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    /// Add a cross-field constraint
    pub fn cross_reference(mut self, field: impl Into<String>, relation: FieldRelation) -> Self {
        self.cross_references.push(CrossReference {
            field: field.into(),
            relation,
        });
        self
    }
}

/// A document submitted for integrity validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Optional title
    #[serde(default)]
    pub title: Option<String>,

    /// Full text content
    #[serde(default)]
    pub content: String,

    /// Reference list
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Structured data record reported by the document
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,

    /// Checks to run against `data`
    #[serde(default)]
    pub data_schema: Vec<FieldCheck>,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a document with text content only
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach citations
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    /// Attach a data record and the checks to run against it
    pub fn with_data(
        mut self,
        data: serde_json::Map<String, serde_json::Value>,
        schema: Vec<FieldCheck>,
    ) -> Self {
        self.data = data;
        self.data_schema = schema;
        self
    }

    /// Number of whitespace-separated words in the content
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_builder() {
        let citation = CitationBuilder::new("ref1", CitationType::Journal)
            .authors("Smith, J.; Doe, A.")
            .title("On Testing")
            .year(2020)
            .journal("Journal of Tests")
            .doi("10.1234/test")
            .build();

        assert_eq!(citation.id, "ref1");
        assert_eq!(citation.author_list(), vec!["Smith, J.", "Doe, A."]);
        assert_eq!(citation.first_author_surname().as_deref(), Some("Smith"));
        assert!(citation.has_field("journal"));
        assert!(!citation.has_field("publisher"));
    }

    #[test]
    fn test_first_author_surname_natural_order() {
        let citation = CitationBuilder::new("ref1", CitationType::Book)
            .authors("Jane Q Public")
            .build();
        assert_eq!(citation.first_author_surname().as_deref(), Some("Public"));
    }

    #[test]
    fn test_document_deserialize_defaults() {
        let doc: Document = serde_json::from_str(
            r#"{"content": "hello world", "citations": [{"id": "r1", "type": "book", "authors": "A, B"}]}"#,
        )
        .unwrap();

        assert_eq!(doc.word_count(), 2);
        assert_eq!(doc.citations[0].citation_type, CitationType::Book);
        assert!(doc.data.is_empty());
        assert!(doc.data_schema.is_empty());
    }

    #[test]
    fn test_field_check_deserialize() {
        let check: FieldCheck = serde_json::from_str(
            r#"{"field": "n", "type": "integer", "required": true,
                "cross_references": [{"field": "total", "relation": "less_or_equal"}]}"#,
        )
        .unwrap();

        assert!(check.required);
        assert_eq!(check.field_type, FieldType::Integer);
        assert_eq!(check.cross_references[0].relation, FieldRelation::LessOrEqual);
    }
}
