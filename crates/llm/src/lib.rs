//! External model adapters (C12): chat completion with retry/backoff,
//! embeddings, and thin speech-to-text/text-to-speech wrappers. Small
//! interfaces implementing the trait seams declared in `bv_rag_core`.

pub mod chat;
pub mod embedder;
pub mod error;
pub mod speech;

pub use chat::{ChatModelConfig, OllamaChatModel};
pub use embedder::HttpEmbedder;
pub use error::LlmError;
pub use speech::{HttpSpeechToText, HttpTextToSpeech};
