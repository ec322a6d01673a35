//! Request/response contract of the relevance-judging collaborator.
//!
//! The same shape serves strategy selection (candidates are strategy
//! descriptions) and passage reranking (candidates are passage texts).

use serde::{Deserialize, Serialize};

/// One item offered to the judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeCandidate {
    /// Identifier the judge must echo back.
    pub id: String,
    /// Description or content shown to the judge.
    pub text: String,
}

impl JudgeCandidate {
    /// Create a judge candidate.
    pub fn new<I: Into<String>, T: Into<String>>(id: I, text: T) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A judging request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeRequest {
    /// The user query.
    pub query: String,
    /// Items to choose from, in presentation order.
    pub candidates: Vec<JudgeCandidate>,
    /// Upper bound on the number of choices.
    pub max_outputs: usize,
}

/// One choice made by the judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeChoice {
    /// Id of the chosen candidate. May be bogus; callers validate it.
    pub id: String,
    /// Why it was chosen.
    #[serde(default)]
    pub rationale: String,
    /// Optional fresh relevance score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl JudgeChoice {
    /// Create a choice without a score.
    pub fn new<I: Into<String>, R: Into<String>>(id: I, rationale: R) -> Self {
        Self {
            id: id.into(),
            rationale: rationale.into(),
            score: None,
        }
    }

    /// Attach a relevance score.
    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// A judging response: choices, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JudgeResponse {
    /// Ordered choices.
    #[serde(default)]
    pub choices: Vec<JudgeChoice>,
}

impl JudgeResponse {
    /// Wrap a list of choices.
    #[must_use]
    pub fn new(choices: Vec<JudgeChoice>) -> Self {
        Self { choices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parses_without_optional_fields() {
        let response: JudgeResponse =
            serde_json::from_str(r#"{"choices":[{"id":"3"},{"id":"1","rationale":"dates","score":0.8}]}"#)
                .unwrap();

        assert_eq!(response.choices.len(), 2);
        assert_eq!(response.choices[0].rationale, "");
        assert_eq!(response.choices[0].score, None);
        assert_eq!(response.choices[1].score, Some(0.8));
    }
}
