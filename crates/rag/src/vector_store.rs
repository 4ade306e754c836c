//! Vector Store using Qdrant (C1)
//!
//! Dense vector similarity search over the regulation corpus. Embeds the
//! query text through a configured `Embedder` before searching, so the
//! `VectorIndexClient` trait seam stays text-in/hits-out.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bv_rag_config::constants::endpoints;
use bv_rag_core::{BackendHit, Embedder, RetrievalFilters, VectorIndexClient};
use qdrant_client::{
    qdrant::{
        value::Kind, Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance,
        FieldCondition, Filter, Match, PointId, PointStruct, PointsIdsList, SearchPointsBuilder,
        UpsertPointsBuilder, VectorParamsBuilder,
    },
    Qdrant,
};

use crate::error::RagError;

/// Vector store configuration
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    pub endpoint: String,
    pub collection: String,
    pub vector_dim: usize,
    pub distance: VectorDistance,
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::QDRANT_DEFAULT.to_string(),
            collection: "bv_rag_chunks".to_string(),
            vector_dim: bv_rag_config::constants::rag::VECTOR_DIM,
            distance: VectorDistance::Cosine,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorDistance {
    Cosine,
    Euclidean,
    DotProduct,
}

impl From<VectorDistance> for Distance {
    fn from(d: VectorDistance) -> Self {
        match d {
            VectorDistance::Cosine => Distance::Cosine,
            VectorDistance::Euclidean => Distance::Euclid,
            VectorDistance::DotProduct => Distance::Dot,
        }
    }
}

/// A chunk ready for upsert: embedding text plus the payload fields the
/// filters in `RetrievalFilters` match against.
#[derive(Debug, Clone)]
pub struct IndexableChunk {
    pub chunk_id: String,
    pub embedding_text: String,
    pub document: String,
    pub collection: String,
    pub source_type: String,
    pub chunk_type: String,
    pub payload: HashMap<String, String>,
}

/// Qdrant-backed implementation of `VectorIndexClient`.
pub struct QdrantVectorIndex {
    client: Qdrant,
    config: VectorStoreConfig,
    embedder: Arc<dyn Embedder>,
}

impl QdrantVectorIndex {
    pub async fn new(
        config: VectorStoreConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder.build().map_err(|e| RagError::VectorIndex {
            backend: "qdrant".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self { client, config, embedder })
    }

    pub async fn ensure_collection(&self) -> Result<(), RagError> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| self.vector_err(e))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                        VectorParamsBuilder::new(
                            self.config.vector_dim as u64,
                            Distance::from(self.config.distance),
                        ),
                    ),
                )
                .await
                .map_err(|e| self.vector_err(e))?;
        }

        Ok(())
    }

    pub async fn upsert(
        &self,
        chunks: &[IndexableChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RagError> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::VectorIndex {
                backend: "qdrant".to_string(),
                message: "chunk and embedding count mismatch".to_string(),
            });
        }

        let points: Vec<PointStruct> = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, emb)| {
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("text".to_string(), chunk.embedding_text.clone().into());
                payload.insert("document".to_string(), chunk.document.clone().into());
                payload.insert("collection".to_string(), chunk.collection.clone().into());
                payload.insert("source_type".to_string(), chunk.source_type.clone().into());
                payload.insert("chunk_type".to_string(), chunk.chunk_type.clone().into());

                for (k, v) in &chunk.payload {
                    payload.insert(k.clone(), v.clone().into());
                }

                PointStruct::new(chunk.chunk_id.clone(), emb.clone(), payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, points))
            .await
            .map_err(|e| self.vector_err(e))?;

        Ok(())
    }

    /// Current point count for the collection, for the admin stats endpoint.
    pub async fn collection_point_count(&self) -> Result<u64, RagError> {
        let info = self
            .client
            .collection_info(&self.config.collection)
            .await
            .map_err(|e| self.vector_err(e))?;
        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    pub async fn delete(&self, ids: &[String]) -> Result<(), RagError> {
        let points: Vec<PointId> = ids.iter().map(|id| PointId::from(id.clone())).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.config.collection)
                    .points(PointsIdsList { ids: points }),
            )
            .await
            .map_err(|e| self.vector_err(e))?;

        Ok(())
    }

    fn vector_err(&self, e: impl std::fmt::Display) -> RagError {
        RagError::VectorIndex { backend: "qdrant".to_string(), message: e.to_string() }
    }
}

fn to_qdrant_filter(filters: &RetrievalFilters) -> Option<Filter> {
    let mut conditions = Vec::new();

    let mut push = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            conditions.push(Condition {
                condition_one_of: Some(qdrant_client::qdrant::condition::ConditionOneOf::Field(
                    FieldCondition {
                        key: key.to_string(),
                        r#match: Some(Match {
                            match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(
                                v.clone(),
                            )),
                        }),
                        ..Default::default()
                    },
                )),
            });
        }
    };

    push("document", &filters.document);
    push("collection", &filters.collection);
    push("source_type", &filters.source_type);
    push("chunk_type", &filters.chunk_type);

    if conditions.is_empty() {
        None
    } else {
        Some(Filter { must: conditions, ..Default::default() })
    }
}

#[async_trait]
impl VectorIndexClient for QdrantVectorIndex {
    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &RetrievalFilters,
    ) -> bv_rag_core::Result<Vec<BackendHit>> {
        let query_embedding = self.embedder.embed(query_text).await?;

        let mut search_builder =
            SearchPointsBuilder::new(&self.config.collection, query_embedding, top_k as u64)
                .with_payload(true);

        if let Some(f) = to_qdrant_filter(filters) {
            search_builder = search_builder.filter(f);
        }

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| bv_rag_core::Error::from(self.vector_err(e)))?;

        let hits = results
            .result
            .into_iter()
            .map(|point| {
                let mut metadata = HashMap::new();
                let mut text = String::new();

                for (k, v) in point.payload {
                    if k == "text" {
                        if let Some(Kind::StringValue(s)) = v.kind {
                            text = s;
                        }
                    } else if let Some(Kind::StringValue(s)) = v.kind {
                        metadata.insert(k, s);
                    }
                }

                let chunk_id = point
                    .id
                    .map(|pid| match pid.point_id_options {
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u,
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => {
                            n.to_string()
                        },
                        None => String::new(),
                    })
                    .unwrap_or_default();

                BackendHit { chunk_id, text, score: point.score, metadata }
            })
            .collect();

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = VectorStoreConfig::default();
        assert_eq!(config.vector_dim, 1024);
        assert_eq!(config.distance, VectorDistance::Cosine);
    }

    #[test]
    fn test_filter_translation() {
        let filters = RetrievalFilters { document: Some("SOLAS".to_string()), ..Default::default() };
        let f = to_qdrant_filter(&filters).unwrap();
        assert_eq!(f.must.len(), 1);
    }

    #[test]
    fn test_empty_filter_translation() {
        assert!(to_qdrant_filter(&RetrievalFilters::default()).is_none());
    }
}
