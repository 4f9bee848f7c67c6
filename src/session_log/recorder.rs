//! Append-only session log

use crate::error::Result;
use crate::session_log::event::Event;
use crate::session_log::store::{upsert, LogStore, StoredSession};
use crate::types::{Outcome, SessionId};
use chrono::{DateTime, Utc};

/// Sink the bargaining engine writes its events into
pub trait EventRecorder: Send {
    /// Session started at `started_at`; called once before the first event
    fn begin(&mut self, _started_at: DateTime<Utc>) {}

    /// Append one event. Never fails from the caller's point of view.
    fn record(&mut self, event: &Event);

    /// Mark the session finished with `outcome`
    fn conclude(&mut self, _outcome: Outcome) {}

    /// Retry any write that failed earlier
    fn flush(&mut self) {}
}

/// Recorder that keeps nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRecorder;

impl EventRecorder for NullRecorder {
    fn record(&mut self, _event: &Event) {}
}

/// Session log backed by a [`LogStore`].
///
/// The in-memory entry is authoritative. If the store rejects a write the log
/// stays dirty and the next `record`, `conclude` or `flush` writes the full
/// entry again.
pub struct SessionLog<S: LogStore> {
    store: S,
    entry: StoredSession,
    dirty: bool,
}

impl<S: LogStore> SessionLog<S> {
    /// Start logging a new session into `store`
    pub fn new(store: S, session_id: SessionId, started_at: DateTime<Utc>) -> Self {
        Self {
            store,
            entry: StoredSession::new(session_id, started_at),
            dirty: false,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.entry.game_id
    }

    /// Events recorded for the current session
    pub fn events(&self) -> &[Event] {
        &self.entry.rounds
    }

    pub fn entry(&self) -> &StoredSession {
        &self.entry
    }

    /// True when the last write to the store failed and has not been retried yet
    pub fn pending_flush(&self) -> bool {
        self.dirty
    }

    /// Stored events for `session_id`, empty if none were stored
    pub fn load(&self, session_id: &SessionId) -> Result<Vec<Event>> {
        load_events(&self.store, session_id)
    }

    /// Every stored session
    pub fn sessions(&self) -> Result<Vec<StoredSession>> {
        self.store.read_all()
    }

    /// Erase all persisted sessions. The current session's in-memory entry is
    /// kept and is written again on its next event.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("Cleared all stored sessions");
        Ok(())
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) {
        match self.try_persist() {
            Ok(()) => {
                if self.dirty {
                    tracing::info!("Session log for {} caught up", self.entry.game_id);
                }
                self.dirty = false;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to persist session log for {}: {} (will retry)",
                    self.entry.game_id,
                    e
                );
                self.dirty = true;
            }
        }
    }

    fn try_persist(&mut self) -> Result<()> {
        let mut sessions = self.store.read_all()?;
        upsert(&mut sessions, &self.entry);
        self.store.write_all(&sessions)
    }
}

impl<S: LogStore> EventRecorder for SessionLog<S> {
    fn begin(&mut self, started_at: DateTime<Utc>) {
        self.entry.timestamp = started_at;
    }

    fn record(&mut self, event: &Event) {
        tracing::debug!(
            "Recording {} (round {}) for {}",
            event.type_name(),
            event.round_number,
            self.entry.game_id
        );
        self.entry.rounds.push(event.clone());
        self.persist();
    }

    fn conclude(&mut self, outcome: Outcome) {
        self.entry.final_outcome = Some(outcome);
        self.persist();
    }

    fn flush(&mut self) {
        if self.dirty {
            self.persist();
        }
    }
}

/// Stored events for `session_id` in `store`, empty if none were stored
pub fn load_events<S: LogStore + ?Sized>(store: &S, session_id: &SessionId) -> Result<Vec<Event>> {
    Ok(store
        .read_all()?
        .into_iter()
        .find(|s| &s.game_id == session_id)
        .map(|s| s.rounds)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PieError;
    use crate::session_log::event::EventKind;
    use crate::session_log::store::MemoryStore;
    use crate::types::Player;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn start_event() -> Event {
        Event::new(EventKind::GameStart { initial_share: 100 }, 1, at())
    }

    fn offer_event() -> Event {
        Event::new(
            EventKind::OfferMade {
                player: Player::Player1,
                amount_kept: 60,
                amount_offered: 40,
            },
            1,
            at(),
        )
    }

    /// Memory store whose writes can be switched off
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: Arc<AtomicBool>,
    }

    impl LogStore for FlakyStore {
        fn read_all(&self) -> Result<Vec<StoredSession>> {
            self.inner.read_all()
        }

        fn write_all(&mut self, sessions: &[StoredSession]) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PieError::Storage("disk full".to_string()));
            }
            self.inner.write_all(sessions)
        }

        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_record_persists_each_event() {
        let store = MemoryStore::new();
        let mut log = SessionLog::new(store.clone(), SessionId::from("g1"), at());

        log.record(&start_event());
        log.record(&offer_event());

        let stored = store.read_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].rounds, vec![start_event(), offer_event()]);
        assert_eq!(stored[0].final_outcome, None);
    }

    #[test]
    fn test_record_merges_with_other_sessions() {
        let store = MemoryStore::new();

        let mut first = SessionLog::new(store.clone(), SessionId::from("g1"), at());
        first.record(&start_event());

        let mut second = SessionLog::new(store.clone(), SessionId::from("g2"), at());
        second.record(&start_event());

        // Updating the first session must not drop the second
        first.conclude(Outcome::Accepted);

        let stored = store.read_all().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].game_id, SessionId::from("g1"));
        assert_eq!(stored[0].final_outcome, Some(Outcome::Accepted));
        assert_eq!(stored[1].game_id, SessionId::from("g2"));
    }

    #[test]
    fn test_load() {
        let store = MemoryStore::new();
        let mut log = SessionLog::new(store, SessionId::from("g1"), at());
        log.record(&start_event());

        assert_eq!(log.load(&SessionId::from("g1")).unwrap(), vec![start_event()]);
        assert!(log.load(&SessionId::from("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_clear_then_record_restores_current_session() {
        let store = MemoryStore::new();
        let mut log = SessionLog::new(store.clone(), SessionId::from("g1"), at());
        log.record(&start_event());

        log.clear().unwrap();
        assert!(store.read_all().unwrap().is_empty());

        log.record(&offer_event());
        let stored = store.read_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].rounds.len(), 2);
    }

    #[test]
    fn test_failed_write_retried_on_next_event() {
        let store = FlakyStore::default();
        let mut log = SessionLog::new(store.clone(), SessionId::from("g1"), at());

        store.failing.store(true, Ordering::SeqCst);
        log.record(&start_event());

        assert!(log.pending_flush());
        assert_eq!(log.events().len(), 1);
        assert!(store.read_all().unwrap().is_empty());

        store.failing.store(false, Ordering::SeqCst);
        log.record(&offer_event());

        assert!(!log.pending_flush());
        let stored = store.read_all().unwrap();
        assert_eq!(stored[0].rounds, vec![start_event(), offer_event()]);
    }

    #[test]
    fn test_flush_retries_failed_conclude() {
        let store = FlakyStore::default();
        let mut log = SessionLog::new(store.clone(), SessionId::from("g1"), at());
        log.record(&start_event());

        store.failing.store(true, Ordering::SeqCst);
        log.conclude(Outcome::Accepted);
        assert!(log.pending_flush());
        assert_eq!(store.read_all().unwrap()[0].final_outcome, None);

        store.failing.store(false, Ordering::SeqCst);
        log.flush();

        assert!(!log.pending_flush());
        assert_eq!(
            store.read_all().unwrap()[0].final_outcome,
            Some(Outcome::Accepted)
        );
    }

    #[test]
    fn test_flush_when_clean_writes_nothing() {
        let store = MemoryStore::new();
        let mut log = SessionLog::new(store.clone(), SessionId::from("g1"), at());

        log.flush();

        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_begin_sets_stored_timestamp() {
        let store = MemoryStore::new();
        let started = Utc.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap();
        let mut log = SessionLog::new(store.clone(), SessionId::from("g1"), at());

        log.begin(started);
        log.record(&start_event());

        assert_eq!(store.read_all().unwrap()[0].timestamp, started);
    }
}
