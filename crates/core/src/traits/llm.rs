//! External adapter traits (C12): chat completion, embeddings, speech.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    Error,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub text: String,
    pub total_time_ms: u64,
    pub finish_reason: FinishReason,
}

/// A chat-capable model backend. Implementations exist for the
/// `primary` and `fast` model tiers selected by the answer generator's
/// router.
#[async_trait]
pub trait ChatModel: Send + Sync + 'static {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion>;

    fn model_name(&self) -> &str;

    /// Rough token estimate, used for context-budget packing.
    fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count() / 4 + 1
    }
}

/// Text embedding backend, fixed output dimensionality per deployment.
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

/// Thin speech-to-text adapter around an external API.
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Thin text-to-speech adapter around an external API.
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    fn audio_format(&self) -> &str {
        "mp3"
    }
}
