//! LLM agent module: the chat-completions caller.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint with reqwest. Every
//! failure (transport, auth, quota, bad request, empty reply) is folded into
//! [`AgentError::Upstream`] with the provider's message kept verbatim.

use crate::config::Config;
use crate::prompt::{ChatMessage, ModelParams};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!(
    "mailmind/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cladam/mailmind)"
);

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    Upstream(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Anything that can turn chat messages into a single reply
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &ModelParams,
    ) -> Result<String, AgentError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Chat-completions client holding the user's key for this session only
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client for the configured endpoint
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Create a client from config and an already resolved key
    pub fn from_config(config: &Config, api_key: &str) -> Result<Self, AgentError> {
        Self::new(
            config.model.endpoint.clone(),
            api_key,
            Duration::from_secs(config.model.timeout_secs),
        )
    }
}

#[async_trait]
impl ModelCaller for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &ModelParams,
    ) -> Result<String, AgentError> {
        let body = CompletionRequest {
            model: &params.model_id,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };

        info!(model = %params.model_id, messages = messages.len(), "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Upstream(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::Upstream(e.to_string()))?;
        debug!(%status, bytes = text.len(), "completion response received");

        if !status.is_success() {
            return Err(AgentError::Upstream(error_message(status.as_u16(), &text)));
        }

        parse_completion(&text)
    }
}

/// Pull the first choice's content out of a completions payload
fn parse_completion(text: &str) -> Result<String, AgentError> {
    let parsed: CompletionResponse = serde_json::from_str(text)
        .map_err(|e| AgentError::Upstream(format!("unexpected response body: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AgentError::Upstream("response contained no message content".to_string()))
}

/// Provider error message if the body carries one, else the raw body
fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("HTTP {}: {}", status, envelope.error.message),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}
