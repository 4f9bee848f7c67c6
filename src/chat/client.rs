//! Chat service contract and the OpenAI Chat Completions client

use crate::config::ChatConfig;
use crate::error::{PieError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use super::types::ChatMessage;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const SYSTEM_PROMPT: &str = "You are a helpful assistant explaining a vlaai bargaining game. \
The game involves two players deciding how to split a traditional Limburg vlaai (pie). \
Players take turns offering what percentage of the vlaai they want to keep for themselves. \
Be concise but friendly in your responses, and occasionally mention interesting facts about \
vlaai from the Limburg region.";

/// Opaque request/response text service
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Reply to `new_user_text` given the earlier conversation
    async fn send_chat_message(&self, prior: &[ChatMessage], new_user_text: &str)
        -> Result<String>;
}

/// Client for the OpenAI Chat Completions API
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    config: ChatConfig,
}

impl OpenAiChatClient {
    /// Build a client whose requests fail after `config.request_timeout_secs`
    pub fn new(api_key: impl Into<String>, config: ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PieError::Configuration(format!("chat HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Build a client with the key from `OPENAI_API_KEY`
    pub fn from_env(config: ChatConfig) -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PieError::MissingCredential(format!("{} is not set", API_KEY_ENV)))?;
        Self::new(api_key, config)
    }

    fn build_request(&self, prior: &[ChatMessage], new_user_text: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(prior.len() + 2);
        messages.push(RequestMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        });
        messages.extend(prior.iter().map(|m| RequestMessage {
            role: m.role.as_str().to_string(),
            content: m.text.clone(),
        }));
        messages.push(RequestMessage {
            role: "user".to_string(),
            content: new_user_text.to_string(),
        });

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    async fn send_chat_message(
        &self,
        prior: &[ChatMessage],
        new_user_text: &str,
    ) -> Result<String> {
        let body = self.build_request(prior, new_user_text);

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PieError::ChatRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| PieError::ChatRequest(format!("invalid response: {}", e)))?;

        extract_text(parsed)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<RequestMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(PieError::ChatEmptyResponse)
}

fn map_http_error(status: StatusCode, body: &str) -> PieError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());

    PieError::ChatStatus {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiChatClient {
        OpenAiChatClient::new("test-key", ChatConfig::default()).unwrap()
    }

    #[test]
    fn test_request_layout() {
        let prior = vec![
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("How many rounds?"),
            ChatMessage::assistant("Three."),
        ];

        let request = client().build_request(&prior, "Who starts?");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4");
        assert_eq!(value["max_tokens"], 200);
        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "How many rounds?");
        assert_eq!(messages[4]["role"], "user");
        assert_eq!(messages[4]["content"], "Who starts?");
    }

    #[test]
    fn test_extract_text() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Player 1 starts."}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(parsed).unwrap(), "Player 1 starts.");

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_text(empty), Err(PieError::ChatEmptyResponse)));
    }

    #[test]
    fn test_map_http_error() {
        let err = map_http_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "Chat service returned 401: Incorrect API key provided"
        );

        let raw = map_http_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(raw, PieError::ChatStatus { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_stalled_endpoint_times_out() {
        // Accepts the connection and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let config = ChatConfig {
            endpoint: format!("http://{}/v1/chat/completions", addr),
            request_timeout_secs: 1,
            ..ChatConfig::default()
        };
        let client = OpenAiChatClient::new("test-key", config).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            client.send_chat_message(&[], "Who starts?"),
        )
        .await
        .expect("request should give up on its own");

        assert!(matches!(result, Err(PieError::ChatRequest(_))));
        server.abort();
    }
}
