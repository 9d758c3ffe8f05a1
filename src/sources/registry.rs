//! Registry of external collaborators.

use std::sync::Arc;

use super::{CitationVerifier, DoiResolver, InMemoryIndex, KnownSourceIndex, SourceError};
use crate::config::Config;

bitflags::bitflags! {
    /// Collaborators a registry can offer
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const LOCAL_INDEX = 1 << 0;
        const PLAGIARISM_INDEX = 1 << 1;
        const DOI_RESOLUTION = 1 << 2;
        const CITATION_VERIFICATION = 1 << 3;
    }
}

/// Collaborators available to the analyzers
///
/// The local index is always present. Remote collaborators are optional and
/// only consulted when a check's context asks for them.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    local_index: Arc<InMemoryIndex>,
    plagiarism_index: Option<Arc<dyn KnownSourceIndex>>,
    doi_resolver: Option<Arc<dyn DoiResolver>>,
    citation_verifier: Option<Arc<dyn CitationVerifier>>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    /// Create a registry with only an empty local index
    pub fn new() -> Self {
        Self {
            local_index: Arc::new(InMemoryIndex::default()),
            plagiarism_index: None,
            doi_resolver: None,
            citation_verifier: None,
        }
    }

    /// Create a registry with the HTTP collaborators from config
    #[cfg(feature = "http-sources")]
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let sources = &config.sources;
        let doi = super::DoiOrgResolver::with_base_url(&sources.doi_resolver_url)?;
        let crossref =
            super::CrossRefVerifier::with_base_url(&sources.crossref_api_url, sources.mailto.as_deref())?;

        Ok(Self::local_from_config(config)?
            .with_doi_resolver(Arc::new(doi))
            .with_citation_verifier(Arc::new(crossref)))
    }

    /// Without HTTP support only the local index is available
    #[cfg(not(feature = "http-sources"))]
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Self::local_from_config(config)
    }

    /// Registry whose local index follows the plagiarism settings and holds
    /// the configured known texts
    fn local_from_config(config: &Config) -> Result<Self, SourceError> {
        let index = InMemoryIndex::from_config(&config.plagiarism);
        if let Some(dir) = &config.sources.known_sources_dir {
            index.load_dir(dir)?;
        }
        Ok(Self::new().with_local_index(Arc::new(index)))
    }

    pub fn with_local_index(mut self, index: Arc<InMemoryIndex>) -> Self {
        self.local_index = index;
        self
    }

    pub fn with_plagiarism_index(mut self, index: Arc<dyn KnownSourceIndex>) -> Self {
        self.plagiarism_index = Some(index);
        self
    }

    pub fn with_doi_resolver(mut self, resolver: Arc<dyn DoiResolver>) -> Self {
        self.doi_resolver = Some(resolver);
        self
    }

    pub fn with_citation_verifier(mut self, verifier: Arc<dyn CitationVerifier>) -> Self {
        self.citation_verifier = Some(verifier);
        self
    }

    pub fn local_index(&self) -> &Arc<InMemoryIndex> {
        &self.local_index
    }

    pub fn plagiarism_index(&self) -> Option<&Arc<dyn KnownSourceIndex>> {
        self.plagiarism_index.as_ref()
    }

    pub fn doi_resolver(&self) -> Option<&Arc<dyn DoiResolver>> {
        self.doi_resolver.as_ref()
    }

    pub fn citation_verifier(&self) -> Option<&Arc<dyn CitationVerifier>> {
        self.citation_verifier.as_ref()
    }

    /// Describe the collaborators registered
    pub fn capabilities(&self) -> SourceCapabilities {
        let mut caps = SourceCapabilities::LOCAL_INDEX;
        if self.plagiarism_index.is_some() {
            caps |= SourceCapabilities::PLAGIARISM_INDEX;
        }
        if self.doi_resolver.is_some() {
            caps |= SourceCapabilities::DOI_RESOLUTION;
        }
        if self.citation_verifier.is_some() {
            caps |= SourceCapabilities::CITATION_VERIFICATION;
        }
        caps
    }
}
