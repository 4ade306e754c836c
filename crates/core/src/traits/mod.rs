//! Pluggable-backend traits implemented by the retrieval and generation
//! crates and wired together at the server boundary.

pub mod llm;
pub mod retrieval;

pub use llm::{ChatCompletion, ChatMessage, ChatModel, Embedder, FinishReason, Role, SpeechToText, TextToSpeech};
pub use retrieval::{BackendHit, ChunkLookup, LexicalIndexClient, ReferenceGraphClient, VectorIndexClient};
