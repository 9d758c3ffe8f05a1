//! Structured data checks driven by the document's field schema.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::time::Instant;

use super::{penalty_score, AnalyzerError, Validator};
use crate::config::PenaltyConfig;
use crate::models::{
    Document, FieldCheck, FieldRelation, FieldType, IssueCode, IssueLocation, IssueType,
    RuleCategory, Severity, ValidationContext, ValidationIssue, ValidationResult,
};

fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

fn has_type(value: &Value, field_type: FieldType) -> bool {
    match field_type {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Date => value.as_str().is_some_and(is_date),
        FieldType::Array => value.is_array(),
        FieldType::Object => value.is_object(),
    }
}

/// Lossless conversion of `value` to `field_type`, where one exists
fn coerce(value: &Value, field_type: FieldType) -> Option<Value> {
    match (field_type, value) {
        (FieldType::Number, Value::String(s)) => {
            let n: f64 = s.trim().parse().ok()?;
            serde_json::Number::from_f64(n).map(Value::Number)
        }
        (FieldType::Integer, Value::String(s)) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Some(Value::from(n));
            }
            let n: f64 = s.parse().ok()?;
            integral(n)
        }
        (FieldType::Integer, Value::Number(n)) => integral(n.as_f64()?),
        (FieldType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn integral(n: f64) -> Option<Value> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64).then(|| Value::from(n as i64))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// String form used for pattern matching
fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON equality that treats 1 and 1.0 as equal
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Order two values when they are both numbers, both dates or both strings
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    let (x, y) = (a.as_str()?, b.as_str()?);
    if let (Ok(dx), Ok(dy)) = (
        NaiveDate::parse_from_str(x, "%Y-%m-%d"),
        NaiveDate::parse_from_str(y, "%Y-%m-%d"),
    ) {
        return Some(dx.cmp(&dy));
    }
    Some(x.cmp(y))
}

fn relation_holds(relation: FieldRelation, a: &Value, b: &Value) -> Option<bool> {
    if relation == FieldRelation::Equals {
        return Some(values_equal(a, b));
    }
    let ordering = compare(a, b)?;
    Some(match relation {
        FieldRelation::Equals => ordering == Ordering::Equal,
        FieldRelation::LessThan => ordering == Ordering::Less,
        FieldRelation::LessOrEqual => ordering != Ordering::Greater,
        FieldRelation::GreaterThan => ordering == Ordering::Greater,
        FieldRelation::GreaterOrEqual => ordering != Ordering::Less,
    })
}

/// Checks a document's data record against its field schema
#[derive(Debug, Clone, Default)]
pub struct DataConsistencyChecker {
    penalties: PenaltyConfig,
}

impl DataConsistencyChecker {
    pub fn new(penalties: PenaltyConfig) -> Self {
        Self { penalties }
    }

    /// Run every field check against `data`
    pub fn check(&self, data: &Map<String, Value>, schema: &[FieldCheck]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for check in schema {
            self.check_field(data, check, &mut issues);
        }
        issues
    }

    fn check_field(&self, data: &Map<String, Value>, check: &FieldCheck, issues: &mut Vec<ValidationIssue>) {
        let field = check.field.as_str();
        let location = IssueLocation::section(field);

        let value = match data.get(field) {
            Some(Value::Null) | None => {
                if check.required {
                    issues.push(
                        ValidationIssue::new(
                            IssueType::DataInconsistency,
                            IssueCode::MissingField,
                            Severity::Critical,
                            format!("Required field '{}' is missing", field),
                        )
                        .at(location),
                    );
                }
                return;
            }
            Some(value) => value,
        };

        let coerced;
        let value = if has_type(value, check.field_type) {
            value
        } else {
            let mut issue = ValidationIssue::new(
                IssueType::DataInconsistency,
                IssueCode::InvalidType,
                Severity::Major,
                format!(
                    "Field '{}' should be {} but is {}",
                    field,
                    check.field_type.id(),
                    type_name(value)
                ),
            )
            .at(location.clone())
            .evidence(value.to_string());

            match coerce(value, check.field_type) {
                Some(fixed) => {
                    issues.push(issue.fix(fixed.to_string(), true));
                    coerced = fixed;
                    &coerced
                }
                None => {
                    issue = issue.fix(format!("Provide a {} value", check.field_type.id()), false);
                    issues.push(issue);
                    return;
                }
            }
        };

        if let Some(pattern) = &check.pattern {
            match Regex::new(pattern) {
                Ok(re) => {
                    let text = text_form(value);
                    if !re.is_match(&text) {
                        issues.push(
                            ValidationIssue::new(
                                IssueType::DataInconsistency,
                                IssueCode::InvalidPattern,
                                Severity::Minor,
                                format!("Field '{}' does not match pattern {}", field, pattern),
                            )
                            .at(location.clone())
                            .evidence(text)
                            .fix(format!("Reformat the value to match {}", pattern), true),
                        );
                    }
                }
                Err(e) => {
                    tracing::debug!("Invalid pattern for field {}: {}", field, e);
                    issues.push(
                        ValidationIssue::new(
                            IssueType::DataInconsistency,
                            IssueCode::InvalidPattern,
                            Severity::Warning,
                            format!("Schema pattern for field '{}' is not a valid regex", field),
                        )
                        .at(location.clone())
                        .evidence(e.to_string()),
                    );
                }
            }
        }

        if let Some(allowed) = &check.allowed_values {
            if !allowed.iter().any(|a| values_equal(a, value)) {
                let listed: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
                issues.push(
                    ValidationIssue::new(
                        IssueType::DataInconsistency,
                        IssueCode::InvalidValue,
                        Severity::Major,
                        format!("Field '{}' has a value outside {}", field, listed.join(", ")),
                    )
                    .at(location.clone())
                    .evidence(value.to_string()),
                );
            }
        }

        for reference in &check.cross_references {
            let Some(other) = data.get(&reference.field).filter(|v| !v.is_null()) else {
                continue;
            };

            let holds = relation_holds(reference.relation, value, other);
            if holds != Some(true) {
                let reason = if holds.is_none() { " (values not comparable)" } else { "" };
                issues.push(
                    ValidationIssue::new(
                        IssueType::DataInconsistency,
                        IssueCode::CrossReferenceMismatch,
                        Severity::Major,
                        format!(
                            "Expected {} {} {}{}",
                            field,
                            reference.relation.symbol(),
                            reference.field,
                            reason
                        ),
                    )
                    .at(location.clone())
                    .evidence(format!("{} = {}", field, value))
                    .evidence(format!("{} = {}", reference.field, other)),
                );
            }
        }
    }
}

#[async_trait]
impl Validator for DataConsistencyChecker {
    fn id(&self) -> &str {
        "data_consistency"
    }

    fn name(&self) -> &str {
        "Data consistency"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Data
    }

    fn algorithm(&self) -> &str {
        "schema-field-check"
    }

    async fn validate(
        &self,
        document: &Document,
        context: &ValidationContext,
    ) -> Result<ValidationResult, AnalyzerError> {
        let started = Instant::now();
        let issues = self.check(&document.data, &document.data_schema);
        let score = penalty_score(&issues, &self.penalties);

        // Nothing declared, nothing verified
        let confidence = if document.data_schema.is_empty() { 50.0 } else { 100.0 };

        let mut suggestions = Vec::new();
        if issues.iter().any(|i| i.auto_fixable) {
            suggestions.push("Apply the suggested conversions to the flagged fields".to_string());
        }
        if issues.iter().any(|i| i.code == IssueCode::CrossReferenceMismatch) {
            suggestions.push("Verify related values against the source data".to_string());
        }

        let mut result = ValidationResult::new(self.id(), self.category(), score, confidence, issues)
            .passed_at(context.thresholds.data_integrity)
            .suggestions(suggestions);
        result.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn checker() -> DataConsistencyChecker {
        DataConsistencyChecker::default()
    }

    #[test]
    fn test_missing_required_is_critical() {
        let schema = vec![
            FieldCheck::new("n", FieldType::Integer).required(),
            FieldCheck::new("optional", FieldType::String),
        ];
        let issues = checker().check(&data(json!({"other": 1})), &schema);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::MissingField);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].location.section.as_deref(), Some("n"));
    }

    #[test]
    fn test_type_mismatch_with_coercion() {
        let schema = vec![
            FieldCheck::new("n", FieldType::Integer),
            FieldCheck::new("mean", FieldType::Number),
            FieldCheck::new("blinded", FieldType::Boolean),
            FieldCheck::new("count", FieldType::Integer),
        ];
        let record = data(json!({"n": "120", "mean": "4.5", "blinded": "TRUE", "count": 12.0}));
        let issues = checker().check(&record, &schema);

        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|i| i.code == IssueCode::InvalidType && i.auto_fixable));
        assert_eq!(issues[0].suggested_fix.as_deref(), Some("120"));
        assert_eq!(issues[1].suggested_fix.as_deref(), Some("4.5"));
        assert_eq!(issues[2].suggested_fix.as_deref(), Some("true"));
        assert_eq!(issues[3].suggested_fix.as_deref(), Some("12"));
    }

    #[test]
    fn test_type_mismatch_without_coercion() {
        let schema = vec![FieldCheck::new("n", FieldType::Integer)];
        let issues = checker().check(&data(json!({"n": "many"})), &schema);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Major);
        assert!(!issues[0].auto_fixable);
    }

    #[test]
    fn test_dates() {
        let schema = vec![FieldCheck::new("collected", FieldType::Date)];
        assert!(checker().check(&data(json!({"collected": "2021-03-04"})), &schema).is_empty());
        assert_eq!(checker().check(&data(json!({"collected": "March"})), &schema).len(), 1);
    }

    #[test]
    fn test_pattern_and_allowed_values() {
        let schema = vec![
            FieldCheck::new("id", FieldType::String).pattern(r"^P\d{3}$"),
            FieldCheck::new("group", FieldType::String).allowed(vec![json!("control"), json!("treatment")]),
        ];
        let issues = checker().check(&data(json!({"id": "p12", "group": "placebo"})), &schema);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, IssueCode::InvalidPattern);
        assert_eq!(issues[0].severity, Severity::Minor);
        assert!(issues[0].auto_fixable);
        assert_eq!(issues[1].code, IssueCode::InvalidValue);
        assert_eq!(issues[1].severity, Severity::Major);
    }

    #[test]
    fn test_invalid_regex_is_warning() {
        let schema = vec![FieldCheck::new("id", FieldType::String).pattern("([unclosed")];
        let issues = checker().check(&data(json!({"id": "x"})), &schema);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_cross_references() {
        let schema = vec![
            FieldCheck::new("completed", FieldType::Integer)
                .cross_reference("enrolled", FieldRelation::LessOrEqual),
            FieldCheck::new("start", FieldType::Date).cross_reference("end", FieldRelation::LessThan),
            FieldCheck::new("total", FieldType::Number).cross_reference("sum", FieldRelation::Equals),
        ];

        let ok = data(json!({
            "completed": 90, "enrolled": 100,
            "start": "2020-01-01", "end": "2020-06-30",
            "total": 10, "sum": 10.0
        }));
        assert!(checker().check(&ok, &schema).is_empty());

        let bad = data(json!({
            "completed": 120, "enrolled": 100,
            "start": "2021-01-01", "end": "2020-06-30",
            "total": 10, "sum": 11
        }));
        let issues = checker().check(&bad, &schema);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.code == IssueCode::CrossReferenceMismatch));
        assert_eq!(issues[0].description, "Expected completed <= enrolled");
    }

    #[tokio::test]
    async fn test_validate_scores_by_penalty() {
        let document = Document::new("").with_data(
            data(json!({"n": "abc"})),
            vec![
                FieldCheck::new("n", FieldType::Integer),
                FieldCheck::new("arm", FieldType::String).required(),
            ],
        );

        let result = checker()
            .validate(&document, &ValidationContext::default())
            .await
            .unwrap();

        // critical 25 + major 15
        assert_eq!(result.score, 60.0);
        assert!(!result.passed);
        assert_eq!(result.category, RuleCategory::Data);
    }

    #[tokio::test]
    async fn test_validate_without_schema() {
        let result = checker()
            .validate(&Document::new("text"), &ValidationContext::default())
            .await
            .unwrap();

        assert_eq!(result.score, 100.0);
        assert_eq!(result.confidence, 50.0);
        assert!(result.passed);
    }
}
