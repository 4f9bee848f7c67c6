//! piesplit: two-player split-the-pie bargaining experiment
//!
//! - [`bargaining`]: offer/accept/reject state machine with round limits
//! - [`session_log`]: append-only event log and its durable store
//! - [`chat`]: rules assistant backed by a chat completion service
//! - [`export`]: experiment export artifact for offline analysis

pub mod bargaining;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod session_log;
pub mod types;

pub use bargaining::{BargainingEngine, GameRules, Resolution, RoundState, Session};
pub use error::{PieError, Result};
pub use session_log::{Event, EventKind, SessionLog};
pub use types::{Outcome, Player, SessionId};
