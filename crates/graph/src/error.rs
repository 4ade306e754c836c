//! Crate-local error type for the reference-graph client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph database error: {0}")]
    Database(String),

    #[error("malformed row: {0}")]
    MalformedRow(String),
}

impl From<GraphError> for bv_rag_core::Error {
    fn from(err: GraphError) -> Self {
        bv_rag_core::Error::IndexUnavailable { backend: "reference_graph".to_string(), message: err.to_string() }
    }
}

impl From<sqlx::Error> for GraphError {
    fn from(err: sqlx::Error) -> Self {
        GraphError::Database(err.to_string())
    }
}
