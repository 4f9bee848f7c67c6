//! Experiment log events

use crate::types::Player;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable record of one thing that happened in a session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    /// Round in which the event happened
    #[serde(rename = "round")]
    pub round_number: u32,
}

impl Event {
    pub fn new(kind: EventKind, round_number: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            timestamp,
            round_number,
        }
    }

    /// Wire name of the event type
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

/// Event payloads, serialized as `{"type": ..., "data": {...}}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum EventKind {
    #[serde(rename_all = "camelCase")]
    GameStart { initial_share: u32 },

    #[serde(rename_all = "camelCase")]
    OfferMade {
        player: Player,
        amount_kept: u32,
        amount_offered: u32,
    },

    #[serde(rename_all = "camelCase")]
    OfferAccepted {
        offering_player: Player,
        receiving_player: Player,
        amount_kept: u32,
        amount_given: u32,
    },

    #[serde(rename_all = "camelCase")]
    OfferRejected {
        offering_player: Player,
        rejecting_player: Player,
    },
}

impl EventKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::GameStart { .. } => "gameStart",
            EventKind::OfferMade { .. } => "offerMade",
            EventKind::OfferAccepted { .. } => "offerAccepted",
            EventKind::OfferRejected { .. } => "offerRejected",
        }
    }

    /// One-line history entry, as shown to players
    pub fn describe(&self, round_number: u32) -> String {
        match self {
            EventKind::GameStart { initial_share } => {
                format!("Game started with {} units to split", initial_share)
            }
            EventKind::OfferMade {
                player, amount_kept, ..
            } => format!(
                "Round {}: {} offered to keep {}",
                round_number, player, amount_kept
            ),
            EventKind::OfferAccepted {
                offering_player,
                receiving_player,
                amount_kept,
                ..
            } => format!(
                "{} accepted {}'s offer of {}",
                receiving_player, offering_player, amount_kept
            ),
            EventKind::OfferRejected {
                offering_player,
                rejecting_player,
            } => format!("{} rejected {}'s offer", rejecting_player, offering_player),
        }
    }
}
