use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::constants; // For OPENAI_API_URL, QUPAL_MODEL and friends
use crate::model::{ModelCaller, ModelError};

// Structures matching the OpenAI-compatible /v1/chat/completions endpoint
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    // usage, id etc. are ignored
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Where and how to reach the chat-completions API.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: constants::OPENAI_API_URL.clone(),
            model: constants::QUPAL_MODEL.clone(),
            max_tokens: *constants::QUPAL_MAX_TOKENS,
            timeout: Duration::from_secs(*constants::QUPAL_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Shared HTTP client for the chat-completions API. The key is supplied per
/// call so the server can rotate it without rebuilding the client.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10).min(config.timeout))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Bind a key snapshot to this client for the duration of one turn.
    pub fn with_key(&self, api_key: Option<String>) -> KeyedModel<'_> {
        KeyedModel {
            client: self,
            api_key,
        }
    }

    #[instrument(
        skip(self, api_key, system_prompt, user_message),
        fields(model = %self.config.model)
    )]
    pub async fn chat(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, ModelError> {
        let request_payload = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            max_tokens: self.config.max_tokens,
        };

        debug!(url = %self.config.api_url, "Sending chat completion request");

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request_payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %error_body, "Chat completion request failed");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        let reply = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ModelError::EmptyResponse)?;

        debug!(reply_len = reply.len(), "Received chat completion");
        Ok(reply)
    }
}

/// An [`LlmClient`] paired with the key snapshot taken for one turn.
pub struct KeyedModel<'a> {
    client: &'a LlmClient,
    api_key: Option<String>,
}

#[async_trait]
impl<'a> ModelCaller for KeyedModel<'a> {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, ModelError> {
        let api_key = self.api_key.as_deref().ok_or(ModelError::MissingApiKey)?;
        self.client.chat(api_key, system_prompt, user_message).await
    }
}
