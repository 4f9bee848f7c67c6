//! Bargaining module: the split-the-pie state machine

pub mod engine;
pub mod responder;
pub mod types;

pub use engine::BargainingEngine;
pub use responder::ThresholdResponder;
pub use types::{
    GameRules, NextOfferer, Offer, Phase, Resolution, RoundState, Session, Shares,
};
