//! Prompt-writing service client.
//!
//! Calls a chat-completions-style endpoint to draft or refine a step's
//! prompt text. The system message carries a fixed creative-director
//! role plus writing guidelines; the user message is built from the
//! step-specific instruction and, when present, the current prompt as a
//! refinement seed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default chat-completions endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for prompt writing.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Fixed role section of the system message.
const SYSTEM_ROLE: &str = "You are a senior creative director writing image-generation \
     prompts for premium lifestyle product campaigns.";

/// Fixed guidelines section of the system message.
const SYSTEM_GUIDELINES: &str = "Write one vivid, concrete prompt per request. Cover \
     subject, setting, lighting, and mood in flowing prose. No lists, no preamble, no \
     quotation marks.";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the prompt-writing service.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Prompt service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response parsed but carried no generated text.
    #[error("Prompt service response did not contain any text")]
    MissingText,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices.into_iter().next()?.message?.content
    }
}

// ---------------------------------------------------------------------------
// PromptWriter
// ---------------------------------------------------------------------------

/// The prompt-writing seam consumed by the step controllers.
#[async_trait]
pub trait PromptWriter: Send + Sync {
    /// Draft a prompt for `instruction`, optionally refining `seed`.
    async fn write_prompt(&self, instruction: &str, seed: &str) -> Result<String, PromptError>;
}

/// Production client for the chat-completions endpoint.
pub struct PromptClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl PromptClient {
    /// Create a client with the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the endpoint URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Round-trip a trivial exchange to verify credentials and
    /// connectivity. Returns the assistant's reply text.
    pub async fn test_connection(&self) -> Result<String, PromptError> {
        self.complete(vec![
            ChatMessage {
                role: "system",
                content: "You are a helpful assistant.".to_string(),
            },
            ChatMessage {
                role: "user",
                content: "Hello, are you working?".to_string(),
            },
        ])
        .await
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, PromptError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PromptError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed.into_text().ok_or(PromptError::MissingText)
    }
}

#[async_trait]
impl PromptWriter for PromptClient {
    async fn write_prompt(&self, instruction: &str, seed: &str) -> Result<String, PromptError> {
        self.complete(vec![
            ChatMessage {
                role: "system",
                content: format!("{SYSTEM_ROLE}\n\n{SYSTEM_GUIDELINES}"),
            },
            ChatMessage {
                role: "user",
                content: build_user_message(instruction, seed),
            },
        ])
        .await
    }
}

/// Build the user message: the step instruction plus, when a seed is
/// present, a refinement clause carrying the current prompt.
fn build_user_message(instruction: &str, seed: &str) -> String {
    let mut message = format!("Create a creative prompt for: {instruction}.");
    if !seed.is_empty() {
        message.push_str(&format!(" refine and enhance this idea: \"{seed}\""));
    }
    message
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- user message construction --

    #[test]
    fn user_message_without_seed() {
        let message = build_user_message("A main character", "");
        assert_eq!(message, "Create a creative prompt for: A main character.");
    }

    #[test]
    fn user_message_with_seed_appends_refinement_clause() {
        let message = build_user_message("A main character", "a woman in her 30s");
        assert_eq!(
            message,
            "Create a creative prompt for: A main character. \
             refine and enhance this idea: \"a woman in her 30s\""
        );
    }

    // -- response parsing --

    #[test]
    fn response_text_extraction() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "a refined prompt" } }]
        }))
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("a refined prompt"));
    }

    #[test]
    fn response_without_choices_yields_none() {
        let empty: ChatResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.into_text().is_none());

        let no_content: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": {} }]
        }))
        .unwrap();
        assert!(no_content.into_text().is_none());
    }

    // -- request shape --

    #[test]
    fn chat_request_serializes_model_and_roles() {
        let body = ChatRequest {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys".to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: "usr".to_string(),
                },
            ],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "usr");
    }
}
