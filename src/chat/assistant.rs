//! Rules assistant: transcript keeping around a [`ChatService`]

use crate::error::{PieError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::client::ChatService;
use super::types::{ChatMessage, ChatTranscript};

/// Opening message shown before the player says anything
pub const GREETING: &str = "Hello! I'm here to help explain the vlaai bargaining game. \
In this game, you'll negotiate how to split a traditional Limburg vlaai with another player. \
What percentage would you like to keep for yourself?";

/// Reply substituted when the chat service fails
pub const APOLOGY: &str = "I apologize, but I encountered an error. Please try again.";

/// Chat front end shared between the input loop and spawned request tasks.
///
/// At most one request is outstanding at a time. Service failures never
/// escape: they become [`APOLOGY`] in the transcript.
#[derive(Clone)]
pub struct ChatAssistant {
    service: Arc<dyn ChatService>,
    transcript: Arc<Mutex<ChatTranscript>>,
    in_flight: Arc<AtomicBool>,
    history_window: usize,
}

impl ChatAssistant {
    /// `history_window` bounds how many earlier messages go with each request
    pub fn new(service: Arc<dyn ChatService>, history_window: usize) -> Self {
        let mut transcript = ChatTranscript::new();
        transcript.push(ChatMessage::assistant(GREETING));

        Self {
            service,
            transcript: Arc::new(Mutex::new(transcript)),
            in_flight: Arc::new(AtomicBool::new(false)),
            history_window,
        }
    }

    /// True while a request is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Copy of the conversation so far
    pub async fn transcript(&self) -> ChatTranscript {
        self.transcript.lock().await.clone()
    }

    /// Send `text` and return the assistant's reply (or the apology)
    pub async fn ask(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PieError::EmptyMessage);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PieError::ChatBusy);
        }
        let _guard = InFlight(&self.in_flight);

        let prior = {
            let mut transcript = self.transcript.lock().await;
            let prior = transcript.trailing(self.history_window).to_vec();
            transcript.push(ChatMessage::user(text));
            prior
        };

        let reply = match self.service.send_chat_message(&prior, text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                APOLOGY.to_string()
            }
        };

        self.transcript
            .lock()
            .await
            .push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }
}

/// Clears the in-flight flag when the request finishes or is dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
