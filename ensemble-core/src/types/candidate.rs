//! Passages returned by strategies and the tagged candidates built from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference back into the corpus (chunk id, file offset, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    /// Wrap a corpus reference.
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// The raw reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One hit as a strategy reports it.
///
/// A strategy does not know the id it was registered under, so its output
/// carries no attribution; the ensemble retriever turns it into a
/// [`Candidate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text.
    pub content: String,
    /// Where the passage lives in the corpus.
    pub source_ref: SourceRef,
    /// Strategy-local relevance score. Scales differ between strategies.
    pub score: f32,
}

impl Passage {
    /// Create a new passage.
    pub fn new<C: Into<String>, R: Into<SourceRef>>(content: C, source_ref: R, score: f32) -> Self {
        Self {
            content: content.into(),
            source_ref: source_ref.into(),
            score,
        }
    }
}

/// A passage attributed to the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Passage text.
    pub content: String,
    /// Where the passage lives in the corpus.
    pub source_ref: SourceRef,
    /// Score reported by the originating strategy, never normalized.
    pub raw_score: f32,
    /// Registry id of the originating strategy.
    pub strategy_id: String,
}

impl Candidate {
    /// Tag a passage with the id of the strategy that returned it.
    pub fn from_passage<S: Into<String>>(passage: Passage, strategy_id: S) -> Self {
        Self {
            content: passage.content,
            source_ref: passage.source_ref,
            raw_score: passage.score,
            strategy_id: strategy_id.into(),
        }
    }

    /// Identity used for optional deduplication: same text from the same place.
    #[must_use]
    pub fn identity(&self) -> (&str, &SourceRef) {
        (&self.content, &self.source_ref)
    }
}
