//! Prelude module for convenient imports.

pub use crate::config::{EnsembleConfig, JsonConfigurable, JudgeConfig};
pub use crate::error::{EnsembleError, Result, StrategyFailure};
pub use crate::traits::{RelevanceJudge, RetrievalStrategy};
pub use crate::types::{
    Candidate, GroupBy, JudgeCandidate, JudgeChoice, JudgeRequest, JudgeResponse, MergedPool,
    MetricTable, Passage, RankedCandidate, RankedResult, SelectionDecision, SourceRef,
};
