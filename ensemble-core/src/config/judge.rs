//! Configuration for the LLM-backed relevance judge.

use serde::{Deserialize, Serialize};

use crate::{EnsembleError, Result};

/// Prompting controls for an LLM judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Candidate texts are cut to this many characters in the prompt.
    pub max_content_chars: usize,

    /// Optional instruction prepended to every prompt.
    pub system_prompt: Option<String>,

    /// Log prompts and raw responses at debug level.
    pub verbose: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 500,
            system_prompt: None,
            verbose: false,
        }
    }
}

impl JudgeConfig {
    /// Set the per-candidate character budget.
    #[must_use]
    pub fn with_max_content_chars(mut self, max_content_chars: usize) -> Self {
        self.max_content_chars = max_content_chars;
        self
    }

    /// Set the system prompt.
    pub fn with_system_prompt<S: Into<String>>(mut self, system_prompt: S) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Enable verbose logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_content_chars == 0 {
            return Err(EnsembleError::configuration(
                "max_content_chars must be greater than 0",
            ));
        }
        Ok(())
    }
}
