//! Bargaining types and state machine

use crate::error::{PieError, Result};
use crate::types::{Outcome, Player, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who makes the next offer after a rejection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NextOfferer {
    /// The player who rejected proposes next
    #[default]
    Rejecter,
    /// The player whose offer was rejected proposes again
    Proposer,
}

/// Fixed parameters of one game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameRules {
    pub total_share: u32,
    pub max_rounds: u32,
    pub next_offerer: NextOfferer,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            total_share: 100,
            max_rounds: 3,
            next_offerer: NextOfferer::Rejecter,
        }
    }
}

impl GameRules {
    pub fn validate(&self) -> Result<()> {
        if self.total_share == 0 {
            return Err(PieError::InvalidRules(
                "totalShare must be positive".to_string(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(PieError::InvalidRules(
                "maxRounds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A proposed division: how much the offering player keeps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub offering_player: Player,
    pub amount_kept: u32,
}

/// Final division of the pie
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shares {
    pub player1: u32,
    pub player2: u32,
}

impl Shares {
    pub fn of(&self, player: Player) -> u32 {
        match player {
            Player::Player1 => self.player1,
            Player::Player2 => self.player2,
        }
    }

    /// Shares after `offer` is accepted
    pub fn from_offer(offer: &Offer, total_share: u32) -> Self {
        let kept = offer.amount_kept;
        let given = total_share - kept;
        match offer.offering_player {
            Player::Player1 => Shares {
                player1: kept,
                player2: given,
            },
            Player::Player2 => Shares {
                player1: given,
                player2: kept,
            },
        }
    }
}

/// One played game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_share: u32,
    pub final_shares: Option<Shares>,
}

/// Where the state machine currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingOffer(Player),
    AwaitingResponse(Offer),
    Terminal(Outcome),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Terminal(_))
    }
}

/// Live game state; one per session, mutated in place
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundState {
    pub(crate) round_number: u32,
    pub(crate) max_rounds: u32,
    pub(crate) active_player: Player,
    pub(crate) pending_offer: Option<Offer>,
    pub(crate) is_over: bool,
    pub(crate) outcome: Option<Outcome>,
}

impl RoundState {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            round_number: 1,
            max_rounds,
            active_player: Player::Player1,
            pending_offer: None,
            is_over: false,
            outcome: None,
        }
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Player expected to act next, whether offering or responding
    pub fn active_player(&self) -> Player {
        self.active_player
    }

    pub fn pending_offer(&self) -> Option<&Offer> {
        self.pending_offer.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.is_over
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn phase(&self) -> Phase {
        match (self.outcome, self.pending_offer) {
            (Some(outcome), _) => Phase::Terminal(outcome),
            (None, Some(offer)) => Phase::AwaitingResponse(offer),
            (None, None) => Phase::AwaitingOffer(self.active_player),
        }
    }
}

/// Result of a response to an offer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The offer stands; the game is over
    Accepted(Shares),
    /// The offer was turned down and play continues
    Rejected { next_offerer: Player, round_number: u32 },
    /// The last allowed offer was turned down; nobody gets anything
    RoundLimitReached,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_validation() {
        assert!(GameRules::default().validate().is_ok());

        let no_pie = GameRules {
            total_share: 0,
            ..GameRules::default()
        };
        assert!(matches!(no_pie.validate(), Err(PieError::InvalidRules(_))));

        let no_rounds = GameRules {
            max_rounds: 0,
            ..GameRules::default()
        };
        assert!(no_rounds.validate().is_err());
    }

    #[test]
    fn test_shares_from_offer() {
        let offer = Offer {
            offering_player: Player::Player2,
            amount_kept: 40,
        };
        let shares = Shares::from_offer(&offer, 100);

        assert_eq!(shares.of(Player::Player2), 40);
        assert_eq!(shares.of(Player::Player1), 60);
    }

    #[test]
    fn test_initial_phase() {
        let state = RoundState::new(3);

        assert_eq!(state.phase(), Phase::AwaitingOffer(Player::Player1));
        assert!(!state.phase().is_terminal());
        assert_eq!(state.round_number(), 1);
    }

    #[test]
    fn test_round_state_serialization() {
        let state = RoundState::new(3);
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["roundNumber"], 1);
        assert_eq!(value["activePlayer"], 1);
        assert_eq!(value["pendingOffer"], serde_json::Value::Null);
        assert_eq!(value["isOver"], false);
    }

    #[test]
    fn test_rules_defaults_fill_missing_fields() {
        let rules: GameRules = serde_json::from_str(r#"{"maxRounds": 5}"#).unwrap();

        assert_eq!(rules.max_rounds, 5);
        assert_eq!(rules.total_share, 100);
        assert_eq!(rules.next_offerer, NextOfferer::Rejecter);
    }
}
