//! LLM-backed relevance judge.
//!
//! Serves both strategy selection (candidates are strategy descriptions) and
//! passage reranking (candidates are passage texts). The model is asked for
//! a JSON object; the first `{` to the last `}` of the reply is parsed, so
//! chatter around the object is tolerated.

use async_trait::async_trait;
use serde_json::Value;
use siumai::prelude::*;
use tracing::{debug, instrument};

use ensemble_core::config::JudgeConfig;
use ensemble_core::{
    EnsembleError, JudgeChoice, JudgeRequest, JudgeResponse, RelevanceJudge, Result,
};

/// Relevance judge backed by a Siumai chat client.
///
/// # Examples
///
/// ```rust,no_run
/// use ensemble_query::judge::SiumaiJudge;
/// use siumai::prelude::*;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Siumai::builder().openai().build().await?;
/// let judge = SiumaiJudge::new(client);
/// # Ok(())
/// # }
/// ```
pub struct SiumaiJudge {
    /// Siumai client for LLM calls
    client: Siumai,
    config: JudgeConfig,
}

impl std::fmt::Debug for SiumaiJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiumaiJudge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SiumaiJudge {
    /// Create a judge with default prompting.
    pub fn new(client: Siumai) -> Self {
        Self {
            client,
            config: JudgeConfig::default(),
        }
    }

    /// Create a judge with custom prompting.
    pub fn with_config(client: Siumai, config: JudgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    fn create_prompt(&self, request: &JudgeRequest) -> String {
        let mut prompt = String::new();

        if let Some(system_prompt) = &self.config.system_prompt {
            prompt.push_str(system_prompt);
            prompt.push_str("\n\n");
        }

        prompt.push_str(
            "You judge which of the following candidates are most relevant to a question.\n\n",
        );
        prompt.push_str("Question: ");
        prompt.push_str(&request.query);
        prompt.push_str("\n\nCandidates:\n");

        for candidate in &request.candidates {
            let text: String = candidate
                .text
                .chars()
                .take(self.config.max_content_chars)
                .collect();
            prompt.push_str(&format!("[{}] {}\n", candidate.id, text.replace('\n', " ")));
        }

        prompt.push_str(&format!(
            "\nChoose the {} most relevant candidates, most relevant first.\n",
            request.max_outputs
        ));
        prompt.push_str("Use the ids in square brackets exactly as given.\n");
        prompt.push_str("Respond with a JSON object only:\n");
        prompt.push_str("{\n");
        prompt.push_str("  \"choices\": [\n");
        prompt.push_str("    {\"id\": \"<id>\", \"rationale\": \"<why>\", \"score\": <0.0-1.0>}\n");
        prompt.push_str("  ]\n");
        prompt.push_str("}\n");

        prompt
    }

    #[instrument(skip(self, request), fields(candidates = request.candidates.len()))]
    async fn ask(&self, request: &JudgeRequest) -> Result<String> {
        let prompt = self.create_prompt(request);
        if self.config.verbose {
            debug!("Judge prompt: {}", prompt);
        }

        let messages = vec![ChatMessage::user(prompt).build()];
        let response = self
            .client
            .chat(messages)
            .await
            .map_err(|e| EnsembleError::judge(format!("LLM judge call failed: {e}")))?;

        let content = response.content.all_text();
        if self.config.verbose {
            debug!("Judge response: {}", content);
        }
        Ok(content)
    }
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn choice_of(value: &Value) -> Option<JudgeChoice> {
    let id = match value {
        Value::Object(fields) => fields.get("id").and_then(id_of)?,
        other => id_of(other)?,
    };
    let rationale = value["rationale"].as_str().unwrap_or_default();
    let choice = JudgeChoice::new(id, rationale);
    Some(match value["score"].as_f64() {
        Some(score) => choice.with_score(score as f32),
        None => choice,
    })
}

/// Parse a judge reply into choices.
///
/// Accepts `{"choices": [...]}` and a bare array. Each choice may be an
/// object with an `id` or just the id itself; numeric ids are accepted.
/// Entries without a usable id are skipped. An unscored ranking is cut to
/// `max_outputs` choices; a reply that scores every choice is kept whole.
pub fn parse_judge_reply(reply: &str, max_outputs: usize) -> Result<JudgeResponse> {
    let object = reply
        .find('{')
        .zip(reply.rfind('}'))
        .filter(|(start, end)| start < end)
        .and_then(|(start, end)| serde_json::from_str::<Value>(&reply[start..=end]).ok())
        .filter(|value| value.get("choices").is_some());

    let parsed = match object {
        Some(value) => value,
        None => reply
            .find('[')
            .zip(reply.rfind(']'))
            .filter(|(start, end)| start < end)
            .and_then(|(start, end)| serde_json::from_str::<Value>(&reply[start..=end]).ok())
            .map(|choices| serde_json::json!({ "choices": choices }))
            .ok_or_else(|| EnsembleError::judge("Judge reply contains no JSON choices"))?,
    };

    let choices = parsed["choices"]
        .as_array()
        .ok_or_else(|| EnsembleError::judge("Judge reply 'choices' is not an array"))?;

    let mut parsed_choices: Vec<JudgeChoice> = choices.iter().filter_map(choice_of).collect();
    let fully_scored = !parsed_choices.is_empty() && parsed_choices.iter().all(|c| c.score.is_some());
    if fully_scored {
        // scored replies are sorted and cut by the caller
        return Ok(JudgeResponse::new(parsed_choices));
    }
    if parsed_choices.len() > max_outputs {
        debug!(
            returned = parsed_choices.len(),
            max_outputs, "Judge returned too many choices, truncating"
        );
        parsed_choices.truncate(max_outputs);
    }
    Ok(JudgeResponse::new(parsed_choices))
}

#[async_trait]
impl RelevanceJudge for SiumaiJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeResponse> {
        let reply = self.ask(request).await?;
        parse_judge_reply(&reply, request.max_outputs)
    }

    fn name(&self) -> &'static str {
        "SiumaiJudge"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_with_chatter() {
        let reply = r#"Sure! Here you go:
{"choices": [{"id": "g256", "rationale": "needs dates", "score": 0.9}, {"id": "g128"}]}
Hope this helps."#;

        let response = parse_judge_reply(reply, 5).unwrap();

        assert_eq!(response.choices.len(), 2);
        assert_eq!(response.choices[0].id, "g256");
        assert_eq!(response.choices[0].rationale, "needs dates");
        assert_eq!(response.choices[0].score, Some(0.9));
        assert_eq!(response.choices[1].score, None);
    }

    #[test]
    fn test_parse_bare_array_and_numeric_ids() {
        let response = parse_judge_reply("[3, {\"id\": 1}, {\"rationale\": \"no id\"}]", 5).unwrap();
        let ids: Vec<_> = response.choices.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["3", "1"]);
    }

    #[test]
    fn test_parse_truncates_to_max_outputs() {
        let response = parse_judge_reply(r#"{"choices": ["a", "b", "c"]}"#, 2).unwrap();
        assert_eq!(response.choices.len(), 2);
    }

    #[test]
    fn test_parse_keeps_every_scored_choice() {
        let reply = r#"{"choices": [
            {"id": "0", "score": 0.1},
            {"id": "1", "score": 0.9},
            {"id": "2", "score": 0.3},
            {"id": "3", "score": 0.8}
        ]}"#;

        let response = parse_judge_reply(reply, 2).unwrap();
        let ids: Vec<_> = response.choices.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2", "3"]);
    }

    async fn local_client() -> Siumai {
        Siumai::builder()
            .ollama()
            // siumai 0.4's unified builder requires a key for every provider; Ollama ignores it.
            .api_key("unused")
            .base_url("http://localhost:11434")
            .model("llama3.2")
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_with_config_validates() {
        let err = SiumaiJudge::with_config(
            local_client().await,
            JudgeConfig::default().with_max_content_chars(0),
        )
        .unwrap_err();
        assert!(matches!(err, EnsembleError::Configuration { .. }));

        let judge =
            SiumaiJudge::with_config(local_client().await, JudgeConfig::default().with_max_content_chars(40))
                .unwrap();
        let request = JudgeRequest {
            query: "q".to_string(),
            candidates: vec![ensemble_core::JudgeCandidate::new("0", "x".repeat(100))],
            max_outputs: 1,
        };
        assert!(judge.create_prompt(&request).contains(&format!("[0] {}\n", "x".repeat(40))));
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = parse_judge_reply("I think the second one.", 3).unwrap_err();
        assert!(matches!(err, EnsembleError::Judge { .. }));
    }
}
