//! Registry of retrieval strategies over one corpus.
//!
//! Registration order is significant: it is the default ordering shown to
//! the selection judge, the order used by the select-all fallback, and the
//! column order of metric tables.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ensemble_core::{EnsembleError, JudgeCandidate, Passage, Result, RetrievalStrategy};

/// Static description of what a strategy covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyMetadata {
    /// Short natural-language description, shown to the selection judge.
    pub description: String,
    /// Opaque granularity tag, e.g. passage size in tokens.
    pub granularity: u32,
}

impl StrategyMetadata {
    /// Create strategy metadata.
    pub fn new<S: Into<String>>(description: S, granularity: u32) -> Self {
        Self {
            description: description.into(),
            granularity,
        }
    }
}

/// A retrieval capability registered under a stable id.
///
/// Only a [`StrategyRegistry`] creates these, and they are immutable once
/// registered.
#[derive(Debug)]
pub struct Strategy {
    id: String,
    metadata: StrategyMetadata,
    retriever: Arc<dyn RetrievalStrategy>,
}

impl Strategy {
    /// Registry id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Natural-language description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    /// Granularity tag.
    #[must_use]
    pub fn granularity(&self) -> u32 {
        self.metadata.granularity
    }

    /// Full metadata.
    #[must_use]
    pub fn metadata(&self) -> &StrategyMetadata {
        &self.metadata
    }

    /// Ask the underlying capability for up to `k` passages.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        self.retriever.retrieve(query, k).await
    }

    /// How this strategy is presented to a relevance judge.
    #[must_use]
    pub fn to_judge_candidate(&self) -> JudgeCandidate {
        JudgeCandidate::new(
            self.id.clone(),
            format!(
                "{} (granularity: {})",
                self.metadata.description, self.metadata.granularity
            ),
        )
    }
}

/// Ordered collection of strategies with unique ids.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ensemble_query::registry::{StrategyMetadata, StrategyRegistry};
///
/// # fn example(small: Arc<dyn ensemble_core::RetrievalStrategy>) -> ensemble_core::Result<()> {
/// let mut registry = StrategyRegistry::new();
/// registry.register_with_id("g128", small, StrategyMetadata::new("128-token chunks", 128))?;
/// assert_eq!(registry.get("g128")?.granularity(), 128);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: Vec<Strategy>,
    index: HashMap<String, usize>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under a caller-supplied id.
    pub fn register_with_id<S: Into<String>>(
        &mut self,
        id: S,
        retriever: Arc<dyn RetrievalStrategy>,
        metadata: StrategyMetadata,
    ) -> Result<()> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EnsembleError::validation("Strategy id must not be empty"));
        }
        if self.index.contains_key(&id) {
            return Err(EnsembleError::duplicate_id(id));
        }

        debug!(
            strategy_id = %id,
            granularity = metadata.granularity,
            "Registering strategy"
        );
        self.index.insert(id.clone(), self.strategies.len());
        self.strategies.push(Strategy {
            id,
            metadata,
            retriever,
        });
        Ok(())
    }

    /// Register a strategy under an auto-assigned id and return that id.
    ///
    /// Ids take the form `strategy-<n>`, where `n` starts at the current
    /// registry size and skips ids that are already taken.
    pub fn register(
        &mut self,
        retriever: Arc<dyn RetrievalStrategy>,
        metadata: StrategyMetadata,
    ) -> Result<String> {
        let id = (self.strategies.len()..)
            .map(|n| format!("strategy-{n}"))
            .find(|candidate| !self.index.contains_key(candidate))
            .ok_or_else(|| EnsembleError::configuration("Strategy id space exhausted"))?;

        self.register_with_id(id.clone(), retriever, metadata)?;
        Ok(id)
    }

    /// Look up a strategy by id.
    pub fn get(&self, id: &str) -> Result<&Strategy> {
        self.index
            .get(id)
            .map(|&position| &self.strategies[position])
            .ok_or_else(|| EnsembleError::not_found(format!("strategy '{id}'")))
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Strategies in registration order.
    ///
    /// Each call starts a fresh pass.
    pub fn all(&self) -> std::slice::Iter<'_, Strategy> {
        self.strategies.iter()
    }

    /// Ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(Strategy::id)
    }

    /// Distinct granularity tags in order of first registration.
    #[must_use]
    pub fn granularities(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for strategy in &self.strategies {
            if !seen.contains(&strategy.granularity()) {
                seen.push(strategy.granularity());
            }
        }
        seen
    }

    /// Every strategy as a judge candidate, in registration order.
    #[must_use]
    pub fn judge_candidates(&self) -> Vec<JudgeCandidate> {
        self.strategies
            .iter()
            .map(Strategy::to_judge_candidate)
            .collect()
    }

    /// Number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no strategy is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl<'a> IntoIterator for &'a StrategyRegistry {
    type Item = &'a Strategy;
    type IntoIter = std::slice::Iter<'a, Strategy>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}
