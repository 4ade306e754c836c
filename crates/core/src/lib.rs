//! Shared types and traits for the regulatory answering pipeline.
//!
//! This crate provides the foundations every other crate builds on:
//! the regulation/chunk/session/knowledge data model, the request-scoped
//! error type, and the trait seams pluggable backends implement (vector
//! and lexical index clients, the reference-graph client, chat models,
//! embedders, speech adapters).

pub mod domain;
pub mod error;
pub mod traits;

pub use domain::{
    Applicability, AuthorityLevel, Chunk, ChunkMetadata, ChunkType, ChunkUtility, Collection,
    Concept, Confidence, ConversationSession, CrossReference, EnhancedQuery, InputMode, Intent,
    KnowledgeMatch, MatchedTerm, ModelHint, PageType, PartialFailure, PracticalKnowledgeEntry,
    QueryCategory, QueryClassification, RegulationId, RegulationRecord, RelationKind,
    RequestTiming, RetrievalFilters, RetrievalStrategy, ShipInfo, SourceType, TermSource, Turn,
    TurnRole, MAX_ACTIVE_REGULATIONS,
};
pub use error::{Error, Result};
pub use traits::{
    BackendHit, ChatCompletion, ChatMessage, ChatModel, ChunkLookup, Embedder, FinishReason,
    LexicalIndexClient, ReferenceGraphClient, Role, SpeechToText, TextToSpeech, VectorIndexClient,
};
