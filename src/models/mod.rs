//! Core data models for documents, validation results and integrity checks.

mod check;
mod context;
mod document;
mod issue;
mod result;

pub use check::{
    CategoryScores, CheckMetadata, CheckStatus, CheckType, IntegrityCheck, IntegrityReport,
    QuickScore, RiskLevel,
};
pub use context::{
    AcademicLevel, CitationStyle, ExternalSources, Paradigm, Thresholds, ValidationContext,
};
pub use document::{
    Citation, CitationBuilder, CitationType, CrossReference, Document, FieldCheck, FieldRelation,
    FieldType,
};
pub use issue::{IssueCode, IssueLocation, IssueType, Severity, ValidationIssue};
pub use result::{clamp_score, FabricationRisk, ResultMetadata, RuleCategory, ValidationResult};
