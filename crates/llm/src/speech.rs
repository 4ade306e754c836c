//! Thin speech-to-text / text-to-speech adapters (C12). Out of scope
//! per spec.md's Non-goals beyond a stable call-through interface — no
//! retry/fallback logic beyond what the shared HTTP client already
//! provides, since these sit behind a single external API each.

use async_trait::async_trait;
use bv_rag_core::{SpeechToText, TextToSpeech};
use reqwest::Client;
use std::time::Duration;

use crate::error::LlmError;

pub struct HttpSpeechToText {
    client: Client,
    endpoint: String,
}

impl HttpSpeechToText {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into() })
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe(&self, audio: &[u8]) -> bv_rag_core::Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| bv_rag_core::Error::GenerationUnavailable(LlmError::from(e).to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(bv_rag_core::Error::GenerationUnavailable(format!("stt service returned {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| bv_rag_core::Error::GenerationUnavailable(format!("invalid stt response: {e}")))
    }
}

pub struct HttpTextToSpeech {
    client: Client,
    endpoint: String,
    audio_format: String,
}

impl HttpTextToSpeech {
    pub fn new(endpoint: impl Into<String>, audio_format: impl Into<String>, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into(), audio_format: audio_format.into() })
    }
}

#[async_trait]
impl TextToSpeech for HttpTextToSpeech {
    async fn synthesize(&self, text: &str) -> bv_rag_core::Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text, "format": self.audio_format }))
            .send()
            .await
            .map_err(|e| bv_rag_core::Error::GenerationUnavailable(LlmError::from(e).to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(bv_rag_core::Error::GenerationUnavailable(format!("tts service returned {status}")));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| bv_rag_core::Error::GenerationUnavailable(format!("invalid tts response: {e}")))
    }

    fn audio_format(&self) -> &str {
        &self.audio_format
    }
}
