//! Local in-memory index of known texts.

use async_trait::async_trait;
use std::path::Path;
use std::sync::RwLock;

use super::fingerprint::{normalize_words, SegmentFingerprint, DEFAULT_SHINGLE_SIZE};
use super::{KnownSourceIndex, SourceError, SourceMatch};
use crate::config::PlagiarismConfig;

/// File extensions picked up by [`InMemoryIndex::load_dir`]
const KNOWN_SOURCE_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug)]
struct IndexedSource {
    id: String,
    title: Option<String>,
    words: Vec<String>,
    windows: Vec<SegmentFingerprint>,
}

#[derive(Debug)]
struct IndexState {
    window_words: usize,
    shingle_size: usize,
    sources: Vec<IndexedSource>,
}

/// Index of known texts held in memory
///
/// Each text is cut into overlapping word windows starting at every multiple
/// of the window size and halfway between, so a passage copied at a window
/// boundary lines up exactly and one copied elsewhere still shares at least
/// half its words with some window.
#[derive(Debug)]
pub struct InMemoryIndex {
    state: RwLock<IndexState>,
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new(50, DEFAULT_SHINGLE_SIZE)
    }
}

fn fingerprint_windows(words: &[String], window_words: usize, shingle_size: usize) -> Vec<SegmentFingerprint> {
    let half = window_words / 2;
    (0..words.len())
        .step_by(window_words)
        .flat_map(|base| std::iter::once(base).chain((half > 0).then_some(base + half)))
        .filter(|start| *start < words.len())
        .map(|start| {
            let end = (start + window_words).min(words.len());
            SegmentFingerprint::of(&words[start..end].join(" "), shingle_size)
        })
        .collect()
}

impl InMemoryIndex {
    pub fn new(window_words: usize, shingle_size: usize) -> Self {
        Self {
            state: RwLock::new(IndexState {
                window_words: window_words.max(1),
                shingle_size: shingle_size.max(1),
                sources: Vec::new(),
            }),
        }
    }

    /// Index windowed like the plagiarism detector's segments
    pub fn from_config(config: &PlagiarismConfig) -> Self {
        Self::new(config.segment_words, config.shingle_size)
    }

    /// Window and shingle sizes, in words
    pub fn params(&self) -> (usize, usize) {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        (state.window_words, state.shingle_size)
    }

    /// Change window and shingle sizes, re-fingerprinting every known text
    pub fn reconfigure(&self, window_words: usize, shingle_size: usize) {
        let window_words = window_words.max(1);
        let shingle_size = shingle_size.max(1);

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.window_words == window_words && state.shingle_size == shingle_size {
            return;
        }

        tracing::debug!(
            "Re-indexing {} known sources with {}-word windows and {}-word shingles",
            state.sources.len(),
            window_words,
            shingle_size
        );
        state.window_words = window_words;
        state.shingle_size = shingle_size;
        for source in &mut state.sources {
            source.windows = fingerprint_windows(&source.words, window_words, shingle_size);
        }
    }

    /// Add a known text
    pub fn add_source(&self, id: impl Into<String>, title: Option<String>, text: &str) {
        let id = id.into();
        let words = normalize_words(text);

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let windows = fingerprint_windows(&words, state.window_words, state.shingle_size);
        tracing::debug!("Indexed known source {} ({} windows)", id, windows.len());

        state.sources.retain(|s| s.id != id);
        state.sources.push(IndexedSource {
            id,
            title,
            words,
            windows,
        });
    }

    /// Add every `.txt` and `.md` file in `dir`, keyed by file stem
    pub fn load_dir(&self, dir: &Path) -> Result<usize, SourceError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SourceError::Io(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| KNOWN_SOURCE_EXTENSIONS.contains(&ext))
            })
            .collect();
        paths.sort();

        for path in &paths {
            let text = std::fs::read_to_string(path)
                .map_err(|e| SourceError::Io(format!("{}: {}", path.display(), e)))?;
            let id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.add_source(id, None, &text);
        }

        tracing::info!("Loaded {} known sources from {}", paths.len(), dir.display());
        Ok(paths.len())
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(|e| e.into_inner()).sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

/// Best match per known source, synchronously
    pub fn search(&self, fingerprint: &SegmentFingerprint) -> Vec<SourceMatch> {
        if fingerprint.is_empty() {
            return Vec::new();
        }

        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let mut matches: Vec<SourceMatch> = state
            .sources
            .iter()
            .filter_map(|source| {
                let best = source
                    .windows
                    .iter()
                    .map(|w| fingerprint.similarity(w))
                    .fold(0.0_f64, f64::max);
                (best > 0.0).then(|| SourceMatch {
                    source_id: source.id.clone(),
                    title: source.title.clone(),
                    similarity: best,
                    confidence: 100.0,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.source_id.cmp(&b.source_id))
        });
        matches
    }
}

#[async_trait]
impl KnownSourceIndex for InMemoryIndex {
    fn id(&self) -> &str {
        "local_index"
    }

    async fn lookup(&self, fingerprint: &SegmentFingerprint) -> Result<Vec<SourceMatch>, SourceError> {
        Ok(self.search(fingerprint))
    }
}
