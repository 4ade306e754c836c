//! Centralised default values referenced by `Settings`' per-field
//! `#[serde(default = "...")]` functions.

pub mod endpoints {
    pub const QDRANT_DEFAULT: &str = "http://localhost:6334";
    pub const TANTIVY_INDEX_DIR: &str = "data/lexical_index";
    pub const POSTGRES_DEFAULT: &str = "postgres://localhost:5432/bv_rag";
    pub const REDIS_DEFAULT: &str = "redis://localhost:6379";
    pub const EMBEDDING_SERVICE_DEFAULT: &str = "http://localhost:8081/embed";
    pub const LLM_PRIMARY_DEFAULT: &str = "http://localhost:11434";
    pub const LLM_FAST_DEFAULT: &str = "http://localhost:11434";
    pub const STT_SERVICE_DEFAULT: &str = "http://localhost:8082/transcribe";
    pub const TTS_SERVICE_DEFAULT: &str = "http://localhost:8083/synthesize";
}

/// Retrieval and ranking defaults (§4.6, §4.7, §5).
pub mod rag {
    pub const VECTOR_DIM: usize = 1024;
    pub const RRF_K: f32 = 60.0;
    pub const UTILITY_ALPHA: f32 = 0.3;
    pub const UTILITY_ALPHA_MAX: f32 = 0.5;
    pub const FUSION_SCORE_CEILING: f32 = 0.1;
    pub const MIN_SCORE: f32 = 0.0;
    pub const DYNAMIC_TOP_K_DELTA: usize = 5;
    pub const DYNAMIC_TOP_K_CEILING: usize = 15;
    pub const GRAPH_EXPANSION_TOP_N: usize = 5;
    pub const GRAPH_EXPANSION_DEPTH: usize = 1;
    pub const PARENT_CHAIN_MAX_DEPTH: usize = 20;
    pub const EMBEDDING_TIMEOUT_SECS: u64 = 2;
    pub const INDEX_LEG_TIMEOUT_SECS: u64 = 3;
    pub const LLM_CHAT_TIMEOUT_SECS: u64 = 20;
    pub const COREFERENCE_L3_TIMEOUT_SECS: u64 = 4;
    pub const UTILITY_UPDATE_TIMEOUT_SECS: u64 = 2;
}

/// Conversation memory defaults (§4.9).
pub mod memory {
    pub const SESSION_TTL_HOURS: i64 = 24;
    pub const MAX_CONVERSATION_TURNS: usize = 10;
    pub const SUMMARY_TOKEN_BUDGET: usize = 200;
}

/// Answer generator defaults (§4.10).
pub mod generator {
    pub const CONTEXT_BLOCK_CHAR_LIMIT: usize = 1600;
    pub const CONFIDENCE_HIGH_THRESHOLD: f32 = 0.85;
    pub const CONFIDENCE_MEDIUM_THRESHOLD: f32 = 0.60;
    pub const PROMOTE_LENGTH_THRESHOLD: usize = 60;
    pub const DEMOTE_WORD_THRESHOLD: usize = 15;
}
