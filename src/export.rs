//! Experiment export artifact
//!
//! The JSON layout here is consumed by offline analysis and must stay stable
//! across versions.

use crate::bargaining::{RoundState, Session};
use crate::chat::{ChatMessage, ChatTranscript};
use crate::error::{PieError, Result};
use crate::session_log::{Event, StoredSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Snapshot of one session: metadata, live state, events, optional chat
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport {
    pub session: Session,
    pub state: RoundState,
    pub events: Vec<Event>,
    pub chat_transcript: Option<ChatTranscript>,
}

/// Everything an operator hands off at the end of an experiment run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentExport {
    pub experiment_id: String,
    pub completed_at: DateTime<Utc>,
    pub game_logs: Vec<StoredSession>,
    pub current_game: Option<SessionExport>,
    pub chat_logs: Vec<ChatMessage>,
}

impl ExperimentExport {
    pub fn assemble(
        experiment_id: impl Into<String>,
        completed_at: DateTime<Utc>,
        game_logs: Vec<StoredSession>,
        current_game: Option<SessionExport>,
    ) -> Self {
        let chat_logs = current_game
            .as_ref()
            .and_then(|game| game.chat_transcript.as_ref())
            .map(|transcript| transcript.messages().to_vec())
            .unwrap_or_default();

        Self {
            experiment_id: experiment_id.into(),
            completed_at,
            game_logs,
            current_game,
            chat_logs,
        }
    }

    /// Default experiment id derived from the completion time
    pub fn default_id(completed_at: DateTime<Utc>) -> String {
        format!("experiment_{}", completed_at.format("%Y%m%dT%H%M%SZ"))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the artifact as pretty JSON to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)
            .map_err(|e| PieError::Storage(format!("{}: {}", path.display(), e)))?;
        tracing::info!(
            "Exported {} game log(s) to {}",
            self.game_logs.len(),
            path.display()
        );
        Ok(())
    }
}
