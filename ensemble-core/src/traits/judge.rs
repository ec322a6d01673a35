//! The relevance-judging collaborator.

use async_trait::async_trait;

use crate::{JudgeRequest, JudgeResponse, Result};

/// External relevance judge.
///
/// Given a query and an ordered list of candidates, returns at most
/// `request.max_outputs` choices, best first. Output is not trusted: the
/// selection and rerank stages validate every id and fall back when the
/// response is unusable.
#[async_trait]
pub trait RelevanceJudge: Send + Sync + std::fmt::Debug {
    /// Judge the candidates of `request`.
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeResponse>;

    /// Get a human-readable name for this judge.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
