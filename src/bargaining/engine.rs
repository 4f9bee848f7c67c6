//! Bargaining engine: offer/response state machine for one session

use crate::chat::ChatTranscript;
use crate::error::{PieError, Result};
use crate::export::SessionExport;
use crate::session_log::{Event, EventKind, EventRecorder};
use crate::types::{Clock, Outcome, SessionId};

use super::types::{
    GameRules, NextOfferer, Offer, Phase, Resolution, RoundState, Session, Shares,
};

/// Runs one game of split-the-pie
pub struct BargainingEngine {
    session: Session,
    rules: GameRules,
    state: RoundState,
    history: Vec<Event>,
    recorder: Box<dyn EventRecorder>,
    clock: Box<dyn Clock>,
}

impl BargainingEngine {
    /// Start a new game and record its `gameStart` event
    pub fn start(
        session_id: SessionId,
        rules: GameRules,
        recorder: Box<dyn EventRecorder>,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        rules.validate()?;

        let mut recorder = recorder;
        let started_at = clock.now();
        recorder.begin(started_at);

        let session = Session {
            session_id,
            started_at,
            ended_at: None,
            total_share: rules.total_share,
            final_shares: None,
        };

        let mut engine = Self {
            session,
            rules,
            state: RoundState::new(rules.max_rounds),
            history: Vec::new(),
            recorder,
            clock,
        };

        engine.emit(EventKind::GameStart {
            initial_share: rules.total_share,
        });
        tracing::info!(
            "Started game {} ({} units, {} rounds)",
            engine.session.session_id,
            rules.total_share,
            rules.max_rounds
        );

        Ok(engine)
    }

    /// Active player proposes to keep `amount_kept` for themselves
    pub fn submit_offer(&mut self, amount_kept: i64) -> Result<Offer> {
        self.ensure_not_over()?;
        if self.state.pending_offer.is_some() {
            return Err(PieError::ResponsePending);
        }

        let total = self.rules.total_share;
        let amount_kept = u32::try_from(amount_kept)
            .ok()
            .filter(|kept| *kept <= total)
            .ok_or(PieError::OfferOutOfRange {
                amount: amount_kept,
                total,
            })?;

        let offer = Offer {
            offering_player: self.state.active_player,
            amount_kept,
        };
        self.state.pending_offer = Some(offer);
        self.state.active_player = offer.offering_player.other();

        self.emit(EventKind::OfferMade {
            player: offer.offering_player,
            amount_kept,
            amount_offered: total - amount_kept,
        });
        tracing::info!(
            "Round {}: {} offered to keep {}",
            self.state.round_number,
            offer.offering_player,
            amount_kept
        );

        Ok(offer)
    }

    /// Active player accepts or rejects the pending offer
    pub fn respond(&mut self, accepted: bool) -> Result<Resolution> {
        self.ensure_not_over()?;
        let offer = self.state.pending_offer.ok_or(PieError::NoPendingOffer)?;
        let responder = self.state.active_player;

        if accepted {
            let shares = Shares::from_offer(&offer, self.rules.total_share);

            self.emit(EventKind::OfferAccepted {
                offering_player: offer.offering_player,
                receiving_player: responder,
                amount_kept: offer.amount_kept,
                amount_given: shares.of(responder),
            });
            self.state.pending_offer = None;
            self.finish(Outcome::Accepted, shares);

            tracing::info!(
                "{} accepted: {} gets {}, {} gets {}",
                responder,
                offer.offering_player,
                offer.amount_kept,
                responder,
                shares.of(responder)
            );
            return Ok(Resolution::Accepted(shares));
        }

        self.emit(EventKind::OfferRejected {
            offering_player: offer.offering_player,
            rejecting_player: responder,
        });
        self.state.pending_offer = None;
        self.state.round_number += 1;

        if self.state.round_number > self.state.max_rounds {
            self.finish(Outcome::RoundLimitReached, Shares::default());
            tracing::info!(
                "{} rejected the final offer; maximum rounds reached",
                responder
            );
            return Ok(Resolution::RoundLimitReached);
        }

        let next_offerer = match self.rules.next_offerer {
            NextOfferer::Rejecter => responder,
            NextOfferer::Proposer => offer.offering_player,
        };
        self.state.active_player = next_offerer;

        tracing::info!(
            "{} rejected; round {} begins with {} offering",
            responder,
            self.state.round_number,
            next_offerer
        );
        Ok(Resolution::Rejected {
            next_offerer,
            round_number: self.state.round_number,
        })
    }

    /// Snapshot of the session so far. Pure; callable at any point.
    pub fn export_session(&self, chat: Option<&ChatTranscript>) -> SessionExport {
        SessionExport {
            session: self.session.clone(),
            state: self.state.clone(),
            events: self.history.clone(),
            chat_transcript: chat.cloned(),
        }
    }

    /// Write out anything the session log failed to persist earlier
    pub fn flush_log(&mut self) {
        self.recorder.flush();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> &[Event] {
        &self.history
    }

    /// Prompt describing what happens next
    pub fn status_message(&self) -> String {
        let total = self.rules.total_share;
        match self.phase() {
            Phase::AwaitingOffer(player) if self.state.round_number > 1 => format!(
                "Round {}: {}, make your offer!",
                self.state.round_number, player
            ),
            Phase::AwaitingOffer(player) => format!("{}, make your offer!", player),
            Phase::AwaitingResponse(offer) => format!(
                "{}, accept or reject the offer? {} keeps {}, you get {}",
                self.state.active_player,
                offer.offering_player,
                offer.amount_kept,
                total - offer.amount_kept
            ),
            Phase::Terminal(Outcome::Accepted) => {
                let shares = self.session.final_shares.unwrap_or_default();
                format!(
                    "Offer accepted! Player 1 gets {}, Player 2 gets {}",
                    shares.player1, shares.player2
                )
            }
            Phase::Terminal(Outcome::RoundLimitReached) => {
                "Game Over! Maximum rounds reached. Neither player gets any vlaai!".to_string()
            }
        }
    }

    fn ensure_not_over(&self) -> Result<()> {
        match self.state.outcome {
            Some(outcome) => Err(PieError::GameOver(outcome.to_string())),
            None => Ok(()),
        }
    }

    fn finish(&mut self, outcome: Outcome, shares: Shares) {
        self.state.is_over = true;
        self.state.outcome = Some(outcome);
        self.session.ended_at = Some(self.clock.now());
        self.session.final_shares = Some(shares);
        self.recorder.conclude(outcome);
    }

    fn emit(&mut self, kind: EventKind) {
        let event = Event::new(kind, self.state.round_number, self.clock.now());
        self.recorder.record(&event);
        self.history.push(event);
    }
}
