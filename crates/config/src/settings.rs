//! Process-wide settings, loaded once at boot and immutable thereafter
//! (hot reload replaces the whole value, never mutates in place).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, memory, rag};
use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rag: RagSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default)]
    pub persistence: PersistenceSettings,
    #[serde(default)]
    pub observability: ObservabilitySettings,
    #[serde(default = "default_domain_tables_dir")]
    pub domain_tables_dir: String,
    #[serde(default = "default_knowledge_dir")]
    pub knowledge_dir: String,
}

fn default_domain_tables_dir() -> String {
    "config/domain".to_string()
}

fn default_knowledge_dir() -> String {
    "config/knowledge".to_string()
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Vector/lexical/graph backend connection settings and retrieval/ranking
/// tunables (C1, C2, C3, C6, C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,
    #[serde(default = "default_qdrant_collection")]
    pub qdrant_collection: String,
    #[serde(default)]
    pub qdrant_api_key: Option<String>,
    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,

    #[serde(default = "default_tantivy_dir")]
    pub tantivy_index_dir: String,

    #[serde(default = "default_postgres_url")]
    pub postgres_url: String,

    #[serde(default = "default_embedding_endpoint")]
    pub embedding_endpoint: String,

    /// RRF constant k (§4.7). Must be strictly positive.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,
    /// Utility-blend α in [0, 0.5] (§4.6).
    #[serde(default = "default_utility_alpha")]
    pub utility_alpha: f32,
    /// Ceiling used to normalise raw RRF scores onto [0,1] before blending.
    #[serde(default = "default_fusion_ceiling")]
    pub fusion_score_ceiling: f32,
    #[serde(default)]
    pub min_score: f32,
    #[serde(default = "default_dynamic_top_k_delta")]
    pub dynamic_top_k_delta: usize,
    #[serde(default = "default_dynamic_top_k_ceiling")]
    pub dynamic_top_k_ceiling: usize,
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}
fn default_qdrant_collection() -> String {
    "bv_rag_regulations".to_string()
}
fn default_vector_dim() -> usize {
    rag::VECTOR_DIM
}
fn default_tantivy_dir() -> String {
    endpoints::TANTIVY_INDEX_DIR.to_string()
}
fn default_postgres_url() -> String {
    endpoints::POSTGRES_DEFAULT.to_string()
}
fn default_embedding_endpoint() -> String {
    endpoints::EMBEDDING_SERVICE_DEFAULT.to_string()
}
fn default_rrf_k() -> f32 {
    rag::RRF_K
}
fn default_utility_alpha() -> f32 {
    rag::UTILITY_ALPHA
}
fn default_fusion_ceiling() -> f32 {
    rag::FUSION_SCORE_CEILING
}
fn default_dynamic_top_k_delta() -> usize {
    rag::DYNAMIC_TOP_K_DELTA
}
fn default_dynamic_top_k_ceiling() -> usize {
    rag::DYNAMIC_TOP_K_CEILING
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            qdrant_endpoint: default_qdrant_endpoint(),
            qdrant_collection: default_qdrant_collection(),
            qdrant_api_key: None,
            vector_dim: default_vector_dim(),
            tantivy_index_dir: default_tantivy_dir(),
            postgres_url: default_postgres_url(),
            embedding_endpoint: default_embedding_endpoint(),
            rrf_k: default_rrf_k(),
            utility_alpha: default_utility_alpha(),
            fusion_score_ceiling: default_fusion_ceiling(),
            min_score: rag::MIN_SCORE,
            dynamic_top_k_delta: default_dynamic_top_k_delta(),
            dynamic_top_k_ceiling: default_dynamic_top_k_ceiling(),
        }
    }
}

impl RagSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=0.5).contains(&self.utility_alpha) {
            return Err(ConfigError::InvalidValue {
                field: "rag.utility_alpha".to_string(),
                message: "must be in [0, 0.5]".to_string(),
            });
        }
        if self.rrf_k <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.rrf_k".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Model routing + connection settings (C10, C12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    #[serde(default = "default_primary_endpoint")]
    pub primary_endpoint: String,
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    #[serde(default = "default_fast_endpoint")]
    pub fast_endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
    #[serde(default = "default_coref_timeout_secs")]
    pub coreference_timeout_secs: u64,
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    #[serde(default = "default_stt_endpoint")]
    pub stt_endpoint: String,
    #[serde(default = "default_tts_endpoint")]
    pub tts_endpoint: String,
    #[serde(default = "default_audio_format")]
    pub tts_audio_format: String,
    #[serde(default = "default_speech_timeout_secs")]
    pub speech_timeout_secs: u64,
}

fn default_primary_model() -> String {
    "qwen2.5:32b-instruct".to_string()
}
fn default_primary_endpoint() -> String {
    endpoints::LLM_PRIMARY_DEFAULT.to_string()
}
fn default_fast_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}
fn default_fast_endpoint() -> String {
    endpoints::LLM_FAST_DEFAULT.to_string()
}
fn default_chat_timeout_secs() -> u64 {
    rag::LLM_CHAT_TIMEOUT_SECS
}
fn default_coref_timeout_secs() -> u64 {
    rag::COREFERENCE_L3_TIMEOUT_SECS
}
fn default_max_context_tokens() -> usize {
    8192
}
fn default_stt_endpoint() -> String {
    endpoints::STT_SERVICE_DEFAULT.to_string()
}
fn default_tts_endpoint() -> String {
    endpoints::TTS_SERVICE_DEFAULT.to_string()
}
fn default_audio_format() -> String {
    "mp3".to_string()
}
fn default_speech_timeout_secs() -> u64 {
    10
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            primary_model: default_primary_model(),
            primary_endpoint: default_primary_endpoint(),
            fast_model: default_fast_model(),
            fast_endpoint: default_fast_endpoint(),
            api_key: None,
            chat_timeout_secs: default_chat_timeout_secs(),
            coreference_timeout_secs: default_coref_timeout_secs(),
            max_context_tokens: default_max_context_tokens(),
            stt_endpoint: default_stt_endpoint(),
            tts_endpoint: default_tts_endpoint(),
            tts_audio_format: default_audio_format(),
            speech_timeout_secs: default_speech_timeout_secs(),
        }
    }
}

/// Session store and conversation-memory settings (C9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_max_turns")]
    pub max_conversation_turns: usize,
    #[serde(default = "default_summary_token_budget")]
    pub summary_token_budget: usize,
}

fn default_redis_url() -> String {
    endpoints::REDIS_DEFAULT.to_string()
}
fn default_session_ttl_hours() -> i64 {
    memory::SESSION_TTL_HOURS
}
fn default_max_turns() -> usize {
    memory::MAX_CONVERSATION_TURNS
}
fn default_summary_token_budget() -> usize {
    memory::SUMMARY_TOKEN_BUDGET
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            session_ttl_hours: default_session_ttl_hours(),
            max_conversation_turns: default_max_turns(),
            summary_token_budget: default_summary_token_budget(),
        }
    }
}

/// Utility-store (Postgres) persistence settings (C6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceSettings {
    #[serde(default = "default_true")]
    pub utility_store_enabled: bool,
    #[serde(default = "default_postgres_url")]
    pub postgres_url: String,
    #[serde(default = "default_max_pg_connections")]
    pub max_connections: u32,
}

fn default_max_pg_connections() -> u32 {
    10
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            utility_store_enabled: true,
            postgres_url: default_postgres_url(),
            max_connections: default_max_pg_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    #[serde(default = "default_log_json")]
    pub log_json: bool,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_json() -> bool {
    false
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            log_json: default_log_json(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rag.validate()?;
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "must be nonzero".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads settings layered env > `config/{env}.yaml` > `config/default.yaml`,
/// validating the merged result.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`BV_RAG__` prefix, `__` separator)
/// 2. `config/{env}.yaml` (if `env` is specified)
/// 3. `config/default.yaml`
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();
    builder = builder.add_source(File::with_name("config/default").required(false));
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }
    builder = builder.add_source(
        Environment::with_prefix("BV_RAG")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(settings.rag.enabled);
    }

    #[test]
    fn test_rag_validation_alpha() {
        let mut settings = Settings::default();
        settings.rag.utility_alpha = 0.9;
        assert!(settings.rag.validate().is_err());
        settings.rag.utility_alpha = 0.3;
        assert!(settings.rag.validate().is_ok());
    }

    #[test]
    fn test_rag_validation_rrf_k() {
        let mut settings = Settings::default();
        settings.rag.rrf_k = 0.0;
        assert!(settings.rag.validate().is_err());
    }
}
