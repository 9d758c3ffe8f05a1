//! Input sanitization for tool arguments and identifiers.
//!
//! Tool arguments are checked against a declarative [`InputSchema`]. Every
//! violation is collected rather than stopping at the first, and the
//! accepted arguments come back as a new map holding only declared keys.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Input validation error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Missing required field: {0}")]
    Missing(String),

    #[error("Field '{field}' must be of type {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("Field '{field}' is shorter than {min}")]
    TooShort { field: String, min: usize },

    #[error("Field '{field}' is longer than {max}")]
    TooLong { field: String, max: usize },

    #[error("Field '{field}' must be one of: {allowed}")]
    NotAllowed { field: String, allowed: String },

    #[error("Field '{field}' must be within [{min}, {max}]")]
    OutOfRange { field: String, min: f64, max: f64 },

    #[error("Invalid DOI format: {0}")]
    InvalidDoi(String),
}

impl InputError {
    /// The offending field name
    pub fn field(&self) -> &str {
        match self {
            InputError::Missing(field) => field,
            InputError::WrongType { field, .. }
            | InputError::TooShort { field, .. }
            | InputError::TooLong { field, .. }
            | InputError::NotAllowed { field, .. }
            | InputError::OutOfRange { field, .. } => field,
            InputError::InvalidDoi(_) => "doi",
        }
    }
}

/// Expected JSON type of an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl InputKind {
    fn name(&self) -> &'static str {
        match self {
            InputKind::String => "string",
            InputKind::Integer => "integer",
            InputKind::Number => "number",
            InputKind::Boolean => "boolean",
            InputKind::Array => "array",
            InputKind::Object => "object",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            InputKind::String => value.is_string(),
            InputKind::Integer => value.is_i64() || value.is_u64(),
            InputKind::Number => value.is_number(),
            InputKind::Boolean => value.is_boolean(),
            InputKind::Array => value.is_array(),
            InputKind::Object => value.is_object(),
        }
    }
}

/// Constraint on one argument
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: String,
    pub kind: InputKind,
    pub required: bool,

    /// Minimum string length (chars) or array length
    pub min_length: Option<usize>,

    /// Maximum string length (chars) or array length
    pub max_length: Option<usize>,

    /// Allowed string values
    pub allowed: Option<Vec<String>>,

    /// Numeric bounds
    pub min: Option<f64>,
    pub max: Option<f64>,

    /// HTML-escape string values; off for free text that analyzers read verbatim
    pub escape: bool,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, kind: InputKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            min_length: None,
            max_length: None,
            allowed: None,
            min: None,
            max: None,
            escape: true,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, InputKind::String)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Keep markup characters as-is (control characters are still stripped)
    pub fn raw(mut self) -> Self {
        self.escape = false;
        self
    }
}

/// Declarative schema for a tool's arguments
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    pub fields: Vec<FieldRule>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }
}

/// Validate and sanitize `args` against `schema`
///
/// Unknown keys are dropped. Strings have control characters (other than
/// tab, newline and carriage return) removed and, unless the field is raw,
/// are HTML-escaped.
pub fn validate_input(schema: &InputSchema, args: &Value) -> Result<Map<String, Value>, Vec<InputError>> {
    let empty = Map::new();
    let object = match args {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(vec![InputError::WrongType {
                field: "arguments".to_string(),
                expected: "object",
            }])
        }
    };

    let mut sanitized = Map::new();
    let mut errors = Vec::new();

    for rule in &schema.fields {
        let value = match object.get(&rule.name) {
            None | Some(Value::Null) => {
                if rule.required {
                    errors.push(InputError::Missing(rule.name.clone()));
                }
                continue;
            }
            Some(value) => value,
        };

        if !rule.kind.matches(value) {
            errors.push(InputError::WrongType {
                field: rule.name.clone(),
                expected: rule.kind.name(),
            });
            continue;
        }

        match check_field(rule, value) {
            Ok(clean) => {
                sanitized.insert(rule.name.clone(), clean);
            }
            Err(mut field_errors) => errors.append(&mut field_errors),
        }
    }

    if errors.is_empty() {
        Ok(sanitized)
    } else {
        Err(errors)
    }
}

fn check_field(rule: &FieldRule, value: &Value) -> Result<Value, Vec<InputError>> {
    let mut errors = Vec::new();

    let length = match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    };
    if let Some(length) = length {
        if let Some(min) = rule.min_length.filter(|min| length < *min) {
            errors.push(InputError::TooShort {
                field: rule.name.clone(),
                min,
            });
        }
        if let Some(max) = rule.max_length.filter(|max| length > *max) {
            errors.push(InputError::TooLong {
                field: rule.name.clone(),
                max,
            });
        }
    }

    if let (Some(allowed), Some(s)) = (&rule.allowed, value.as_str()) {
        if !allowed.iter().any(|a| a == s) {
            errors.push(InputError::NotAllowed {
                field: rule.name.clone(),
                allowed: allowed.join(", "),
            });
        }
    }

    if let Some(n) = value.as_f64() {
        let min = rule.min.unwrap_or(f64::NEG_INFINITY);
        let max = rule.max.unwrap_or(f64::INFINITY);
        if n < min || n > max {
            errors.push(InputError::OutOfRange {
                field: rule.name.clone(),
                min,
                max,
            });
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(match value {
        Value::String(s) => Value::String(sanitize_text(s, rule.escape)),
        other => other.clone(),
    })
}

/// Strip control characters and optionally HTML-escape
pub fn sanitize_text(input: &str, escape: bool) -> String {
    let stripped = input
        .chars()
        .filter(|ch| !ch.is_control() || matches!(ch, '\t' | '\n' | '\r'));

    if !escape {
        return stripped.collect();
    }

    let mut out = String::with_capacity(input.len());
    for ch in stripped {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn doi_regex() -> &'static Regex {
    static DOI: OnceLock<Regex> = OnceLock::new();
    DOI.get_or_init(|| Regex::new(r"^10\.\d{4,9}/[-._;()/:A-Za-z0-9]+$").expect("valid DOI regex"))
}

/// Normalize and validate a DOI
///
/// Strips `doi:` and `https://doi.org/` style prefixes, then requires the
/// `10.<registrant>/<suffix>` shape.
pub fn validate_doi(doi: &str) -> Result<String, InputError> {
    let doi = doi.trim();

    if doi.is_empty() {
        return Err(InputError::InvalidDoi("empty DOI".to_string()));
    }

    let lower = doi.to_lowercase();
    let prefix_len = ["doi:", "https://doi.org/", "http://doi.org/", "https://dx.doi.org/"]
        .iter()
        .find(|p| lower.starts_with(*p))
        .map(|p| p.len())
        .unwrap_or(0);
    let doi = doi[prefix_len..].trim();

    if doi.contains("..") {
        return Err(InputError::InvalidDoi("path traversal detected".to_string()));
    }

    if !doi_regex().is_match(doi) {
        return Err(InputError::InvalidDoi(doi.to_string()));
    }

    Ok(doi.to_string())
}
