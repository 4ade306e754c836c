//! HTTP chat-completion adapter implementing `bv_rag_core::ChatModel`,
//! generalizing the teacher's `OllamaBackend` (retry with exponential
//! backoff, `keep_alive`, `GenerationResult` shape) to the closed
//! `bv_rag_core::traits::llm` seam. One instance is constructed per
//! model tier (`primary`/`fast`); the router in the generator crate
//! picks which to call.

use async_trait::async_trait;
use bv_rag_core::{ChatCompletion, ChatMessage, ChatModel, FinishReason, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LlmError;

#[derive(Debug, Clone)]
pub struct ChatModelConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub keep_alive: String,
}

impl ChatModelConfig {
    pub fn primary(model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self { max_tokens: 1024, ..Self::base(model, endpoint) }
    }

    pub fn fast(model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self { max_tokens: 256, ..Self::base(model, endpoint) }
    }

    fn base(model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            endpoint: endpoint.into(),
            api_key: None,
            max_tokens: 512,
            temperature: 0.2,
            timeout: Duration::from_secs(bv_rag_config::constants::rag::LLM_CHAT_TIMEOUT_SECS),
            max_retries: 2,
            initial_backoff: Duration::from_millis(150),
            keep_alive: "5m".to_string(),
        }
    }
}

pub struct OllamaChatModel {
    client: Client,
    config: ChatModelConfig,
}

impl OllamaChatModel {
    pub fn new(config: ChatModelConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!("{}/api/chat", self.config.endpoint)
    }

    async fn execute(&self, request: &OllamaChatRequest) -> Result<OllamaChatResponse, LlmError> {
        let mut builder = self.client.post(self.api_url()).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {status}: {body}")));
            }
            return Err(LlmError::Api(body));
        }

        response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> bv_rag_core::Result<ChatCompletion> {
        let start = std::time::Instant::now();
        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            options: OllamaOptions { temperature: self.config.temperature, num_predict: self.config.max_tokens as i32 },
            keep_alive: self.config.keep_alive.clone(),
        };

        let mut backoff = self.config.initial_backoff;
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(attempt, ?backoff, model = %self.config.model, "retrying chat completion");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute(&request).await {
                Ok(response) => {
                    return Ok(ChatCompletion {
                        text: response.message.content,
                        total_time_ms: start.elapsed().as_millis() as u64,
                        finish_reason: if response.done { FinishReason::Stop } else { FinishReason::Length },
                    });
                }
                Err(e) if e.is_retryable() => last_err = Some(e),
                Err(e) => return Err(bv_rag_core::Error::from(e)),
            }
        }

        Err(bv_rag_core::Error::from(last_err.unwrap_or(LlmError::Network("max retries exceeded".into()))))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
    keep_alive: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OllamaMessage {
    fn from(m: &ChatMessage) -> Self {
        let role = match m.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self { role: role.to_string(), content: m.content.clone() }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_config_has_larger_token_budget_than_fast() {
        let primary = ChatModelConfig::primary("qwen2.5:32b-instruct", "http://localhost:11434");
        let fast = ChatModelConfig::fast("qwen2.5:7b-instruct", "http://localhost:11434");
        assert!(primary.max_tokens > fast.max_tokens);
    }
}
