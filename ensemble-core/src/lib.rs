//! # Ensemble Core
//!
//! Core traits, types, and errors for ensemble retrieval: one corpus, many
//! independently built retrieval strategies, and a per-query decision about
//! which of them to ask.
//!
//! This crate provides:
//!
//! - **Data structures**: `Passage`, `Candidate`, `SelectionDecision`,
//!   `MergedPool`, `RankedResult`, `MetricTable`
//! - **Core traits**: `RetrievalStrategy` and `RelevanceJudge`
//! - **Configuration**: `EnsembleConfig` and `JudgeConfig`, loadable from JSON
//! - **Error handling**: `EnsembleError` with the per-strategy failure record
//!
//! ## Quick Start
//!
//! ```rust
//! use ensemble_core::prelude::*;
//!
//! let passage = Passage::new("Rust 1.0 shipped in May 2015.", "history.md#2", 0.81);
//! let candidate = Candidate::from_passage(passage, "g256");
//! assert_eq!(candidate.strategy_id, "g256");
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used types and traits
pub mod prelude;

// Core modules
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{EnsembleError, Result, StrategyFailure};
pub use types::{
    Candidate, GroupBy, JudgeCandidate, JudgeChoice, JudgeRequest, JudgeResponse, MergedPool,
    MetricTable, Passage, RankedCandidate, RankedResult, SelectionDecision, SourceRef,
};

// Re-export traits for convenience
pub use traits::*;

/// Version information for the ensemble core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the ensemble core library.
pub const NAME: &str = env!("CARGO_PKG_NAME");
