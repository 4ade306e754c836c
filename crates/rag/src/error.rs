//! Crate-local error type, converted into `bv_rag_core::Error` at the
//! boundary every other crate consumes through.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("embedding service unavailable: {0}")]
    Embedding(String),

    #[error("vector index error ({backend}): {message}")]
    VectorIndex { backend: String, message: String },

    #[error("lexical index error ({backend}): {message}")]
    LexicalIndex { backend: String, message: String },

    #[error("utility store error: {0}")]
    UtilityStore(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl From<RagError> for bv_rag_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Embedding(msg) => bv_rag_core::Error::EmbeddingUnavailable(msg),
            RagError::VectorIndex { backend, message } => {
                bv_rag_core::Error::IndexUnavailable { backend, message }
            },
            RagError::LexicalIndex { backend, message } => {
                bv_rag_core::Error::IndexUnavailable { backend, message }
            },
            RagError::UtilityStore(msg) => bv_rag_core::Error::UtilityStoreUnavailable(msg),
            RagError::NotFound(msg) => bv_rag_core::Error::NotFound(msg),
            RagError::InvalidInput(msg) => bv_rag_core::Error::InvalidInput(msg),
            RagError::Other(msg) => bv_rag_core::Error::Other(msg),
        }
    }
}
