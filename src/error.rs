//! Error types for piesplit

use thiserror::Error;

/// Main error type for piesplit
#[derive(Error, Debug)]
pub enum PieError {
    // Bargaining validation errors
    #[error("Please make a valid offer between 0 and {total}")]
    OfferOutOfRange { amount: i64, total: u32 },

    #[error("The game is over: {0}")]
    GameOver(String),

    #[error("No offer is waiting for a response")]
    NoPendingOffer,

    #[error("An offer is already waiting for a response")]
    ResponsePending,

    #[error("Invalid game rules: {0}")]
    InvalidRules(String),

    // Chat errors
    #[error("A chat request is already in progress")]
    ChatBusy,

    #[error("Chat message is empty")]
    EmptyMessage,

    #[error("Chat request failed: {0}")]
    ChatRequest(String),

    #[error("Chat service returned {status}: {message}")]
    ChatStatus { status: u16, message: String },

    #[error("Chat service returned no content")]
    ChatEmptyResponse,

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by front ends to decide how to surface an error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input or out-of-turn action; nothing changed
    Validation,
    /// The chat collaborator failed; game state is unaffected
    Service,
    /// The durable log could not be read or written
    Storage,
    Configuration,
    Internal,
}

impl PieError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PieError::OfferOutOfRange { .. }
            | PieError::GameOver(_)
            | PieError::NoPendingOffer
            | PieError::ResponsePending
            | PieError::InvalidRules(_)
            | PieError::ChatBusy
            | PieError::EmptyMessage => ErrorKind::Validation,
            PieError::ChatRequest(_)
            | PieError::ChatStatus { .. }
            | PieError::ChatEmptyResponse
            | PieError::MissingCredential(_) => ErrorKind::Service,
            PieError::Storage(_) | PieError::Io(_) | PieError::Json(_) => ErrorKind::Storage,
            PieError::Configuration(_) | PieError::InvalidConfig(_) => ErrorKind::Configuration,
            PieError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for errors the player can fix by acting differently
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Result type alias for piesplit operations
pub type Result<T> = std::result::Result<T, PieError>;
