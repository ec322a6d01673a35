//! JSON loading and saving for configuration structures.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EnsembleConfig, JudgeConfig};
use crate::{EnsembleError, Result};

/// Configuration structures that can be loaded from and saved to JSON.
#[allow(async_fn_in_trait)]
pub trait JsonConfigurable: Sized + for<'de> Deserialize<'de> + Serialize {
    /// Validate after loading.
    fn validate_loaded(&self) -> Result<()>;

    /// Load configuration from a JSON file.
    async fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| {
                EnsembleError::configuration(format!(
                    "Failed to read configuration file {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;

        debug!("Loaded configuration from {}", path.as_ref().display());
        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string.
    fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            EnsembleError::configuration(format!("Failed to parse JSON configuration: {e}"))
        })?;
        config.validate_loaded()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    async fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json_string()?;
        tokio::fs::write(path.as_ref(), json).await.map_err(|e| {
            EnsembleError::configuration(format!(
                "Failed to write configuration file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Convert configuration to a pretty-printed JSON string.
    fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            EnsembleError::configuration(format!("Failed to serialize configuration: {e}"))
        })
    }
}

impl JsonConfigurable for EnsembleConfig {
    fn validate_loaded(&self) -> Result<()> {
        self.validate()
    }
}

impl JsonConfigurable for JudgeConfig {
    fn validate_loaded(&self) -> Result<()> {
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invalid_json_config_rejected() {
        let err = EnsembleConfig::from_json_str(r#"{"max_selections": 0}"#).unwrap_err();
        assert!(err.is_client_error());

        let err = JudgeConfig::from_json_str("not json").unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON configuration"));
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ensemble.json");
        let config = EnsembleConfig::default()
            .with_top_n(8)
            .with_dedup_before_rerank(true);

        config.to_json_file(&path).await.unwrap();
        let loaded = EnsembleConfig::from_json_file(&path).await.unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_judge_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("judge.json");
        let config = JudgeConfig::default().with_max_content_chars(120);

        tokio_test::block_on(async {
            config.to_json_file(&path).await.unwrap();
            let loaded = JudgeConfig::from_json_file(&path).await.unwrap();
            assert_eq!(loaded, config);
        });
    }
}
