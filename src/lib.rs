//! # Research Integrity
//!
//! An academic integrity validation engine with a Model Context Protocol (MCP)
//! server front end.
//!
//! Documents are checked by a set of weighted rules (plagiarism, citations,
//! data consistency, methodology, internal consistency and formatting). Each
//! check runs asynchronously and produces an integrity report with category
//! scores, issues and recommendations.
//!
//! ## Architecture
//!
//! - [`models`]: Documents, contexts, issues, results and checks
//! - [`analyzers`]: The per-category evaluators
//! - [`rules`]: Rule definitions and the rule registry
//! - [`engine`]: Orchestration, scoring, events and report export
//! - [`governor`]: Rate limiting, circuit breaking and input sanitization
//! - [`sources`]: External lookups (DOI resolution, bibliographic search, known-source index)
//! - [`mcp`]: MCP protocol implementation and server
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal output for the CLI

pub mod analyzers;
pub mod config;
pub mod engine;
pub mod governor;
pub mod mcp;
pub mod models;
pub mod rules;
pub mod sources;
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use engine::{IntegrityEngine, IntegrityError, ReportFormat};
pub use models::{
    CheckStatus, CheckType, Document, IntegrityCheck, IntegrityReport, ValidationContext,
    ValidationIssue, ValidationResult,
};
pub use sources::SourceRegistry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
