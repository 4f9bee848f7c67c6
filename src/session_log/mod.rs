//! Session log: append-only experiment record

pub mod event;
pub mod recorder;
pub mod store;

pub use event::{Event, EventKind};
pub use recorder::{load_events, EventRecorder, NullRecorder, SessionLog};
pub use store::{JsonFileStore, LogStore, MemoryStore, StoredSession, STORE_KEY};
