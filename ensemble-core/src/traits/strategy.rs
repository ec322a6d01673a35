//! The retrieval capability wrapped by a registered strategy.

use async_trait::async_trait;

use crate::{Passage, Result};

/// A pre-built retrieval capability over the corpus.
///
/// Variants differ only by configuration (chunk granularity, index type),
/// which is described by the registry entry, not by the implementation.
/// Implementations must be safe to call concurrently with themselves and
/// with other strategies, and must not block the executor.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use ensemble_core::{Passage, Result, RetrievalStrategy};
///
/// #[derive(Debug)]
/// struct Fixed;
///
/// #[async_trait]
/// impl RetrievalStrategy for Fixed {
///     async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<Passage>> {
///         Ok(vec![Passage::new("Rust 1.0 shipped in 2015.", "doc-1#0", 0.9)]
///             .into_iter()
///             .take(k)
///             .collect())
///     }
/// }
/// ```
#[async_trait]
pub trait RetrievalStrategy: Send + Sync + std::fmt::Debug {
    /// Return up to `k` passages for `query`, best first.
    ///
    /// `k` is at least 1.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>>;

    /// Get a human-readable name for this strategy implementation.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
