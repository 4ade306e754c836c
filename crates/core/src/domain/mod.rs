//! Domain types shared across the retrieval and generation pipeline.

pub mod knowledge;
pub mod query;
pub mod regulation;
pub mod session;
pub mod timing;

pub use knowledge::{KnowledgeMatch, PracticalKnowledgeEntry};
pub use query::{
    Confidence, EnhancedQuery, Intent, MatchedTerm, ModelHint, QueryClassification,
    RetrievalFilters, RetrievalStrategy, ShipInfo, TermSource,
};
pub use regulation::{
    Applicability, AuthorityLevel, Chunk, ChunkMetadata, ChunkType, ChunkUtility, Collection,
    Concept, CrossReference, PageType, QueryCategory, RegulationRecord, RelationKind, SourceType,
};
pub use session::{ConversationSession, InputMode, Turn, TurnRole, MAX_ACTIVE_REGULATIONS};
pub use timing::{PartialFailure, RegulationId, RequestTiming};
