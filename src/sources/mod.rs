//! External collaborators used by the analyzers.
//!
//! Three async traits describe what the engine needs from the outside world:
//!
//! - [`KnownSourceIndex`] finds previously published text similar to a segment
//! - [`DoiResolver`] tells whether a DOI is registered
//! - [`CitationVerifier`] cross-checks a reference against bibliographic metadata
//!
//! Implementations are registered with a [`SourceRegistry`]. Calls to them are
//! always routed through the [`ResourceGovernor`](crate::governor::ResourceGovernor)
//! except for the local [`InMemoryIndex`], which is pure CPU.
//!
//! # Feature Flags
//!
//! - `http-sources` - HTTP implementations backed by doi.org and CrossRef (default: enabled)

#[cfg(feature = "http-sources")]
mod crossref;
#[cfg(feature = "http-sources")]
mod doi_org;
pub mod fingerprint;
#[cfg(feature = "http-sources")]
mod http;
mod index;
pub mod mock;
mod registry;

#[cfg(feature = "http-sources")]
pub use crossref::CrossRefVerifier;
#[cfg(feature = "http-sources")]
pub use doi_org::DoiOrgResolver;
pub use fingerprint::SegmentFingerprint;
#[cfg(feature = "http-sources")]
pub use http::HttpClient;
pub use index::InMemoryIndex;
pub use mock::{MockCitationVerifier, MockDoiResolver, MockSourceIndex};
pub use registry::{SourceCapabilities, SourceRegistry};

use crate::models::Citation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A previously published text that matched a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMatch {
    /// Identifier of the matched source
    pub source_id: String,

    /// Title of the matched source, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Similarity in [0, 100]
    pub similarity: f64,

    /// How sure the index is about the similarity, in [0, 100]
    #[serde(default = "default_match_confidence")]
    pub confidence: f64,
}

fn default_match_confidence() -> f64 {
    100.0
}

/// Index of known texts queried for plagiarism
#[async_trait]
pub trait KnownSourceIndex: Send + Sync + std::fmt::Debug {
    /// Identifier used for rate limiting and circuit breaking
    fn id(&self) -> &str;

    /// Find known texts similar to a segment, best match first
    async fn lookup(&self, fingerprint: &SegmentFingerprint) -> Result<Vec<SourceMatch>, SourceError>;
}

/// Resolver telling whether a DOI is registered
#[async_trait]
pub trait DoiResolver: Send + Sync + std::fmt::Debug {
    fn id(&self) -> &str;

    /// `Ok(true)` when the DOI resolves, `Ok(false)` when it is unknown
    async fn resolve(&self, doi: &str) -> Result<bool, SourceError>;
}

/// Bibliographic cross-reference for a citation
#[async_trait]
pub trait CitationVerifier: Send + Sync + std::fmt::Debug {
    fn id(&self) -> &str;

    /// `Ok(true)` when a matching record exists
    async fn verify(&self, citation: &Citation) -> Result<bool, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The remote side throttled us
    #[error("Rate limit exceeded")]
    RateLimit,

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// Reading local known texts failed
    #[error("IO error: {0}")]
    Io(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
