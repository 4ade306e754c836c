//! Shared application state (composition root result). Settings are
//! loaded once at boot and never mutated in place; the domain tables are
//! the one piece of state a reload endpoint may atomically replace.

use std::path::PathBuf;
use std::sync::Arc;

use bv_rag_config::{ConfigError, DomainTables, Settings, SharedDomainTables};
use bv_rag_core::{SpeechToText, TextToSpeech};
use bv_rag_graph::PgReferenceGraphClient;
use bv_rag_memory::SessionStore;
use bv_rag_orchestrator::AnsweringPipeline;
use bv_rag_rag::{HybridRetriever, QdrantVectorIndex, QueryClassifier, QueryEnhancer, TantivyLexicalIndex, UtilityStore};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub tables: SharedDomainTables,
    pub domain_tables_dir: PathBuf,

    pub pipeline: Arc<AnsweringPipeline>,

    /// The same retriever instance wired into the pipeline, kept
    /// alongside it so `/api/v1/search` can bypass generation entirely.
    pub retriever: Arc<HybridRetriever>,
    pub classifier: Arc<QueryClassifier>,
    pub enhancer: Arc<QueryEnhancer>,

    pub graph: Arc<PgReferenceGraphClient>,
    pub lexical_index: Arc<TantivyLexicalIndex>,
    pub vector_index: Arc<QdrantVectorIndex>,
    pub sessions: Arc<dyn SessionStore>,
    pub utility_store: Option<Arc<UtilityStore>>,

    pub speech_to_text: Arc<dyn SpeechToText>,
    pub text_to_speech: Arc<dyn TextToSpeech>,

    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<Settings>,
        tables: SharedDomainTables,
        domain_tables_dir: PathBuf,
        pipeline: Arc<AnsweringPipeline>,
        retriever: Arc<HybridRetriever>,
        classifier: Arc<QueryClassifier>,
        enhancer: Arc<QueryEnhancer>,
        graph: Arc<PgReferenceGraphClient>,
        lexical_index: Arc<TantivyLexicalIndex>,
        vector_index: Arc<QdrantVectorIndex>,
        sessions: Arc<dyn SessionStore>,
        utility_store: Option<Arc<UtilityStore>>,
        speech_to_text: Arc<dyn SpeechToText>,
        text_to_speech: Arc<dyn TextToSpeech>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            settings,
            tables,
            domain_tables_dir,
            pipeline,
            retriever,
            classifier,
            enhancer,
            graph,
            lexical_index,
            vector_index,
            sessions,
            utility_store,
            speech_to_text,
            text_to_speech,
            metrics_handle,
        }
    }

    /// Reloads the domain tables from `domain_tables_dir`, atomically
    /// replacing the shared value. `Settings` itself is never reloaded:
    /// every setting is immutable once the process has booted.
    pub fn reload_domain_tables(&self) -> Result<(), ConfigError> {
        let fresh = DomainTables::load(&self.domain_tables_dir)?;
        *self.tables.write() = fresh;
        Ok(())
    }
}
