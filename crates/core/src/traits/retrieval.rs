//! Backend-client traits for the three retrieval legs (C1/C2/C3).

use crate::domain::{Chunk, CrossReference, RegulationRecord, RetrievalFilters};
use crate::Result;
use async_trait::async_trait;

/// A single candidate surfaced by a backend client, before fusion.
#[derive(Debug, Clone)]
pub struct BackendHit {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
    pub metadata: std::collections::HashMap<String, String>,
}

/// Dense vector similarity search over the regulation corpus (C1).
#[async_trait]
pub trait VectorIndexClient: Send + Sync + 'static {
    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &RetrievalFilters,
    ) -> Result<Vec<BackendHit>>;
}

/// Full-text ranked search over the regulation corpus (C2).
#[async_trait]
pub trait LexicalIndexClient: Send + Sync + 'static {
    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &RetrievalFilters,
    ) -> Result<Vec<BackendHit>>;

    /// Exact/near-exact match against regulation and breadcrumb fields,
    /// used when the query clearly names a regulation.
    async fn search_by_regulation_number(&self, reference: &str) -> Result<Vec<BackendHit>>;
}

/// Read-only, idempotent access to the cross-reference graph (C3).
#[async_trait]
pub trait ReferenceGraphClient: Send + Sync + 'static {
    /// Ancestors root-to-leaf, bounded recursion depth.
    async fn get_parent_chain(&self, doc_id: &str) -> Result<Vec<RegulationRecord>>;

    async fn get_children(&self, doc_id: &str) -> Result<Vec<RegulationRecord>>;

    async fn get_cross_references(&self, doc_id: &str) -> Result<Vec<CrossReference>>;

    async fn get_interpretations(&self, doc_id: &str) -> Result<Vec<CrossReference>>;

    async fn get_amendments(&self, doc_id: &str) -> Result<Vec<CrossReference>>;

    /// Regulations linked to a named concept, ordered by document then
    /// regulation id.
    async fn get_related_by_concept(&self, name: &str) -> Result<Vec<RegulationRecord>>;
}

/// Loads a chunk's full text and metadata by id, used to resolve graph
/// expansion targets back into retrievable candidates.
#[async_trait]
pub trait ChunkLookup: Send + Sync + 'static {
    async fn get_chunk(&self, chunk_id: &str) -> Result<Option<Chunk>>;
}
