//! The remote language model as seen by the turn orchestrator.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no API key available")]
    MissingApiKey,
    #[error("request to model API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode model API response: {0}")]
    Decode(String),
    #[error("model API returned no choices")]
    EmptyResponse,
}

/// One request, one complete answer. Implementations bound their own latency.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, ModelError>;
}
