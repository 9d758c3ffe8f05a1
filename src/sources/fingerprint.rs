//! Word shingle fingerprints for text similarity.
//!
//! Text is lowercased, stripped of punctuation and split into words. Every
//! run of `k` consecutive words is hashed with SHA-256, truncated to 64 bits.
//! Two fingerprints are compared with Jaccard similarity over their shingle sets.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Default shingle size in words
pub const DEFAULT_SHINGLE_SIZE: usize = 5;

/// Shingle hashes of one text segment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFingerprint {
    pub shingles: HashSet<u64>,
    pub word_count: usize,
}

impl SegmentFingerprint {
    /// Fingerprint `text` with `k`-word shingles
    ///
    /// Texts shorter than `k` words yield one shingle covering all their words.
    pub fn of(text: &str, k: usize) -> Self {
        let words = normalize_words(text);
        let k = k.max(1);

        let shingles = if words.is_empty() {
            HashSet::new()
        } else if words.len() < k {
            std::iter::once(hash_shingle(&words)).collect()
        } else {
            words.windows(k).map(hash_shingle).collect()
        };

        Self {
            shingles,
            word_count: words.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shingles.is_empty()
    }

    /// Jaccard similarity with another fingerprint, in [0, 100]
    pub fn similarity(&self, other: &SegmentFingerprint) -> f64 {
        jaccard(&self.shingles, &other.shingles) * 100.0
    }
}

/// Lowercase words with punctuation removed
pub fn normalize_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn hash_shingle(words: &[String]) -> u64 {
    let mut hasher = Sha256::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            hasher.update(b" ");
        }
        hasher.update(word.as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Jaccard index of two sets, in [0, 1]; 0 when both are empty
pub fn jaccard(a: &HashSet<u64>, b: &HashSet<u64>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
