//! Embedding adapter (C12) implementing `bv_rag_core::Embedder` against
//! an external embedding service at a fixed dimensionality (§4.1: 1024).

use async_trait::async_trait;
use bv_rag_core::Embedder;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LlmError;

pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(endpoint: impl Into<String>, dimensions: usize, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into(), dimensions })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> bv_rag_core::Result<Vec<f32>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| bv_rag_core::Error::EmbeddingUnavailable(LlmError::from(e).to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(bv_rag_core::Error::EmbeddingUnavailable(format!("{status}: {body}")));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| bv_rag_core::Error::EmbeddingUnavailable(format!("invalid response: {e}")))?;

        if parsed.embedding.len() != self.dimensions {
            return Err(bv_rag_core::Error::EmbeddingUnavailable(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                parsed.embedding.len()
            )));
        }

        Ok(parsed.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_embedder_reports_configured_dimensions() {
        let embedder = HttpEmbedder::new("http://localhost:8081/embed", 1024, 2).unwrap();
        assert_eq!(embedder.dimensions(), 1024);
    }
}
