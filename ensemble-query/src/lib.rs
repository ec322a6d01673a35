//! Selection, fan-out, reranking and rank metrics for ensemble retrieval.
//!
//! One corpus is indexed several ways (different passage sizes, different
//! retrieval techniques). For each query this crate:
//!
//! - **Selects** the strategies worth asking, via a relevance judge
//! - **Fans out** to the chosen strategies concurrently, isolating failures
//! - **Reranks** the merged pool and truncates it to the context budget
//! - **Attributes** the ranked result back to strategies with reciprocal rank
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ensemble_query::prelude::*;
//!
//! # async fn example(
//! #     by_sentence: Arc<dyn RetrievalStrategy>,
//! #     by_section: Arc<dyn RetrievalStrategy>,
//! #     client: siumai::prelude::Siumai,
//! # ) -> Result<()> {
//! let mut registry = StrategyRegistry::new();
//! registry.register_with_id("g128", by_sentence, StrategyMetadata::new("Short passages", 128))?;
//! registry.register_with_id("g1024", by_section, StrategyMetadata::new("Whole sections", 1024))?;
//!
//! let pipeline = EnsemblePipeline::builder()
//!     .registry(registry)
//!     .judge(Arc::new(SiumaiJudge::new(client)))
//!     .build()?;
//!
//! let response = pipeline.query("When was the first stable release?").await?;
//! println!("{} passages of context", response.ranked.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Query → SelectionPolicy → EnsembleRetriever → MergedPool
//!   ↓
//! Reranker → RankedResult → MetricTable
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod judge;
pub mod metric;
pub mod pipeline;
pub mod registry;
pub mod reranker;
pub mod retriever;
pub mod selector;
pub mod utils;

/// Re-export commonly used types and traits.
pub mod prelude {
    pub use crate::judge::SiumaiJudge;
    pub use crate::metric::{by_granularity, by_strategy, reciprocal_rank};
    pub use crate::pipeline::{EnsemblePipeline, EnsemblePipelineBuilder, EnsembleResponse};
    pub use crate::registry::{Strategy, StrategyMetadata, StrategyRegistry};
    pub use crate::reranker::{JudgeReranker, Reranker};
    pub use crate::retriever::EnsembleRetriever;
    pub use crate::selector::{
        AllStrategiesSelector, JudgeSelector, SelectionPolicy, select_or_fallback,
    };

    // Re-export core types
    pub use ensemble_core::prelude::*;
}
