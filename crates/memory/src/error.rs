//! Crate-local error type for the session store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("session store backend error: {0}")]
    Backend(String),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("malformed session record: {0}")]
    Malformed(String),
}

impl From<MemoryError> for bv_rag_core::Error {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::NotFound(id) => bv_rag_core::Error::NotFound(id),
            other => bv_rag_core::Error::SessionStoreUnavailable(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for MemoryError {
    fn from(err: redis::RedisError) -> Self {
        MemoryError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(err: serde_json::Error) -> Self {
        MemoryError::Malformed(err.to_string())
    }
}
