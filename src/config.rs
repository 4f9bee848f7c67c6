//! Configuration for piesplit
//!
//! Read from an optional JSON file; every field has a default. The chat API key
//! is never part of the file and comes from the environment only.

use crate::bargaining::GameRules;
use crate::error::{PieError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub game: GameRules,
    pub storage: StorageConfig,
    pub chat: ChatConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Directory holding the session log store
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = dirs::data_dir()
            .map(|d| d.join("piesplit"))
            .unwrap_or_else(|| PathBuf::from(".piesplit"));
        Self { dir }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Earlier messages sent along with each request
    pub history_window: usize,
    /// Give up on a chat request after this many seconds
    pub request_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 200,
            temperature: 0.7,
            history_window: 20,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given or the file is absent
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(path).map_err(|e| {
                    PieError::Configuration(format!("{}: {}", path.display(), e))
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    PieError::Configuration(format!("{}: {}", path.display(), e))
                })?
            }
            Some(path) => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Config::default()
            }
            None => Config::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.game
            .validate()
            .map_err(|e| PieError::InvalidConfig(e.to_string()))?;
        if self.chat.history_window == 0 {
            return Err(PieError::InvalidConfig(
                "chat.historyWindow must be positive".to_string(),
            ));
        }
        if self.chat.request_timeout_secs == 0 {
            return Err(PieError::InvalidConfig(
                "chat.requestTimeoutSecs must be positive".to_string(),
            ));
        }
        if self.chat.max_tokens == 0 {
            return Err(PieError::InvalidConfig(
                "chat.maxTokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bargaining::NextOfferer;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.game.total_share, 100);
        assert_eq!(config.game.max_rounds, 3);
        assert_eq!(config.chat.model, "gpt-4");
        assert_eq!(config.chat.history_window, 20);
        assert_eq!(config.chat.request_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("piesplit.json");
        fs::write(
            &path,
            r#"{
                "game": { "maxRounds": 5, "nextOfferer": "proposer" },
                "storage": { "dir": "/tmp/pies" },
                "chat": { "historyWindow": 6 }
            }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.game.max_rounds, 5);
        assert_eq!(config.game.total_share, 100);
        assert_eq!(config.game.next_offerer, NextOfferer::Proposer);
        assert_eq!(config.storage.dir, PathBuf::from("/tmp/pies"));
        assert_eq!(config.chat.history_window, 6);
        assert_eq!(config.chat.max_tokens, 200);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "game": { "totalShare": 0 } }"#).unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, PieError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ game: ").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(PieError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let mut config = Config::default();
        config.chat.request_timeout_secs = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("requestTimeoutSecs"));
    }
}
