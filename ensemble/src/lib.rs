//! # Ensemble - multi-strategy retrieval for RAG
//!
//! Index one corpus several ways, let a judge pick which indexes to ask for
//! each query, fan out to them concurrently, rerank the merged results and
//! measure which strategy surfaced the best context.
//!
//! ## Quick Start
//!
//! ```rust
//! use ensemble::prelude::*;
//!
//! let config = EnsembleConfig::default().with_top_n(4);
//! assert!(config.validate().is_ok());
//!
//! let registry = StrategyRegistry::new();
//! assert!(registry.is_empty());
//! ```
//!
//! ## Architecture
//!
//! - **ensemble-core**: Data types, the strategy and judge traits, errors and configuration
//! - **ensemble-query**: Registry, selection, fan-out, reranking and metrics

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use ensemble_core as core;
pub use ensemble_query as query;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits
/// from all ensemble modules.
pub mod prelude {
    pub use ensemble_query::prelude::*;
}

/// Version information for the ensemble framework.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
