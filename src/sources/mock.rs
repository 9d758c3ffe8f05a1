//! Mock collaborators for testing purposes.
//!
//! Each mock answers from data set up front and can be switched to fail or
//! stall, which is how tests drive the governor's breaker and timeout paths.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{
    CitationVerifier, DoiResolver, KnownSourceIndex, SegmentFingerprint, SourceError, SourceMatch,
};
use crate::models::Citation;

/// How a mock reacts to a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// Answer from the configured data
    #[default]
    Normal,
    /// Return a network error
    Fail,
    /// Sleep before answering
    Delay(Duration),
}

async fn apply(behavior: MockBehavior) -> Result<(), SourceError> {
    match behavior {
        MockBehavior::Normal => Ok(()),
        MockBehavior::Fail => Err(SourceError::Network("mock failure".to_string())),
        MockBehavior::Delay(d) => {
            tokio::time::sleep(d).await;
            Ok(())
        }
    }
}

/// DOI resolver answering from a fixed set of registered DOIs
#[derive(Debug, Default)]
pub struct MockDoiResolver {
    registered: Mutex<HashSet<String>>,
    behavior: Mutex<MockBehavior>,
    calls: AtomicUsize,
}

impl MockDoiResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that knows the given DOIs
    pub fn with_dois(dois: &[&str]) -> Self {
        let resolver = Self::new();
        for doi in dois {
            resolver.register(doi);
        }
        resolver
    }

    pub fn register(&self, doi: &str) {
        self.registered
            .lock()
            .unwrap()
            .insert(doi.to_lowercase());
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Number of times `resolve` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DoiResolver for MockDoiResolver {
    fn id(&self) -> &str {
        "doi"
    }

    async fn resolve(&self, doi: &str) -> Result<bool, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        apply(behavior).await?;
        Ok(self.registered.lock().unwrap().contains(&doi.to_lowercase()))
    }
}

/// Citation verifier answering from a set of known titles
#[derive(Debug, Default)]
pub struct MockCitationVerifier {
    known_titles: Mutex<HashSet<String>>,
    behavior: Mutex<MockBehavior>,
    calls: AtomicUsize,
}

impl MockCitationVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_titles(titles: &[&str]) -> Self {
        let verifier = Self::new();
        for title in titles {
            verifier
                .known_titles
                .lock()
                .unwrap()
                .insert(title.to_lowercase());
        }
        verifier
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CitationVerifier for MockCitationVerifier {
    fn id(&self) -> &str {
        "crossref"
    }

    async fn verify(&self, citation: &Citation) -> Result<bool, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        apply(behavior).await?;
        let title = citation.title.as_deref().unwrap_or_default().to_lowercase();
        Ok(self.known_titles.lock().unwrap().contains(&title))
    }
}

/// Remote plagiarism index returning canned matches
#[derive(Debug, Default)]
pub struct MockSourceIndex {
    matches: Mutex<Vec<SourceMatch>>,
    behavior: Mutex<MockBehavior>,
    calls: AtomicUsize,
}

impl MockSourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lookup returns these matches
    pub fn set_matches(&self, matches: Vec<SourceMatch>) {
        *self.matches.lock().unwrap() = matches;
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnownSourceIndex for MockSourceIndex {
    fn id(&self) -> &str {
        "plagiarism_index"
    }

    async fn lookup(&self, _fingerprint: &SegmentFingerprint) -> Result<Vec<SourceMatch>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        apply(behavior).await?;
        Ok(self.matches.lock().unwrap().clone())
    }
}
