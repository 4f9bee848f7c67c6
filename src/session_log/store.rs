//! Durable storage for session logs
//!
//! All sessions live together as one JSON array under a fixed key, the way the
//! browser build kept them in a single storage slot. Writers read the array,
//! replace or append their own entry, and write the whole array back.

use crate::error::{PieError, Result};
use crate::session_log::event::Event;
use crate::types::{Outcome, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Fixed key the session array is stored under
pub const STORE_KEY: &str = "vlaaiGameLogs";

/// One persisted session entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub game_id: SessionId,
    pub rounds: Vec<Event>,
    pub final_outcome: Option<Outcome>,
    /// When the session started
    pub timestamp: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(game_id: SessionId, timestamp: DateTime<Utc>) -> Self {
        Self {
            game_id,
            rounds: Vec::new(),
            final_outcome: None,
            timestamp,
        }
    }
}

/// Backing store for the session array
pub trait LogStore: Send {
    /// Read every stored session; an absent store reads as empty
    fn read_all(&self) -> Result<Vec<StoredSession>>;

    /// Replace the stored array
    fn write_all(&mut self, sessions: &[StoredSession]) -> Result<()>;

    /// Erase every stored session
    fn clear(&mut self) -> Result<()>;
}

/// Replace the entry with the same game id, or append a new one
pub fn upsert(sessions: &mut Vec<StoredSession>, entry: &StoredSession) {
    match sessions.iter_mut().find(|s| s.game_id == entry.game_id) {
        Some(existing) => *existing = entry.clone(),
        None => sessions.push(entry.clone()),
    }
}

/// JSON file store: `<dir>/vlaaiGameLogs.json`, written via temp file + rename
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store inside `dir`, using the fixed file name
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", STORE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PieError::Storage(format!("{}: {}", parent.display(), e)))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)
            .map_err(|e| PieError::Storage(format!("{}: {}", tmp.display(), e)))?;
        file.write_all(bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| PieError::Storage(format!("{}: {}", tmp.display(), e)))?;

        fs::rename(&tmp, &self.path)
            .map_err(|e| PieError::Storage(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

impl LogStore for JsonFileStore {
    fn read_all(&self) -> Result<Vec<StoredSession>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| PieError::Storage(format!("{}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| PieError::Storage(format!("corrupt log store {}: {}", self.path.display(), e)))
    }

    fn write_all(&mut self, sessions: &[StoredSession]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(sessions)?;
        self.write_atomic(&bytes)?;
        tracing::debug!("Wrote {} session(s) to {}", sessions.len(), self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PieError::Storage(format!("{}: {}", self.path.display(), e))),
        }
    }
}

/// In-process store; clones share the same contents
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    sessions: Arc<Mutex<Vec<StoredSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredSession>>> {
        self.sessions
            .lock()
            .map_err(|_| PieError::Internal("memory store lock poisoned".to_string()))
    }
}

impl LogStore for MemoryStore {
    fn read_all(&self) -> Result<Vec<StoredSession>> {
        Ok(self.lock()?.clone())
    }

    fn write_all(&mut self, sessions: &[StoredSession]) -> Result<()> {
        *self.lock()? = sessions.to_vec();
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
