//! Chat assistant that explains the rules

pub mod assistant;
pub mod client;
pub mod types;

pub use assistant::{ChatAssistant, APOLOGY, GREETING};
pub use client::{ChatService, OpenAiChatClient, API_KEY_ENV};
pub use types::{ChatMessage, ChatTranscript, Role};
