//! Layered settings and static domain tables for the regulation RAG
//! pipeline.
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`BV_RAG_` prefix)
//!
//! Static query-understanding and ranking tables (term-expansion groups,
//! topic/ship-type/length/side hints, intent lexicons, the utility
//! reward table, authority-weight overrides, the coreference pronoun
//! lexicon) live under `domain/` and are loaded once at startup as
//! immutable data.

pub mod constants;
pub mod domain;
pub mod settings;

pub use settings::{
    load_settings, LlmSettings, MemorySettings, ObservabilitySettings, PersistenceSettings,
    RagSettings, RuntimeEnvironment, ServerConfig, Settings,
};

pub use domain::{DomainTables, SharedDomainTables};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
