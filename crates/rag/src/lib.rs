//! Hybrid retrieval, ranking and practical-knowledge lookup.
//!
//! Owns the dense vector index client (C1), the lexical index client
//! (C2), the query classifier (C4) and enhancer (C5), the utility store
//! and reranker (C6), the hybrid retriever that fuses all three legs
//! (C7), and the practical-knowledge index (C8).

pub mod error;
pub mod practical_knowledge;
pub mod query_classifier;
pub mod query_enhancer;
pub mod retriever;
pub mod sparse_search;
pub mod utility_store;
pub mod vector_store;

pub use error::RagError;
pub use practical_knowledge::PracticalKnowledgeIndex;
pub use query_classifier::QueryClassifier;
pub use query_enhancer::QueryEnhancer;
pub use retriever::{GraphContext, HitSource, HybridRetriever, RankedHit, RetrieverConfig};
pub use sparse_search::{SparseConfig, TantivyLexicalIndex};
pub use utility_store::{CategoryUtilityStats, InMemoryUtilityStore, UtilityStore};
pub use vector_store::{QdrantVectorIndex, VectorStoreConfig};
