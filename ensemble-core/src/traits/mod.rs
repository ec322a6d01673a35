//! Traits at the boundaries of the ensemble core.
//!
//! - [`RetrievalStrategy`]: one pre-built retrieval capability over the corpus
//! - [`RelevanceJudge`]: the external collaborator that picks strategies and
//!   reorders passages

pub mod judge;
pub mod strategy;

pub use judge::*;
pub use strategy::*;
