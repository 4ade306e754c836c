//! BV-RAG server entry point: loads settings, wires every backend
//! client and the answering pipeline, and serves the HTTP/WebSocket
//! surface with graceful shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use bv_rag_config::domain::{shared, DomainTables};
use bv_rag_config::{load_settings, Settings};
use bv_rag_generator::AnswerGenerator;
use bv_rag_graph::PgReferenceGraphClient;
use bv_rag_llm::{ChatModelConfig, HttpEmbedder, HttpSpeechToText, HttpTextToSpeech, OllamaChatModel};
use bv_rag_memory::{InMemorySessionStore, RedisSessionStore, SessionStore};
use bv_rag_orchestrator::{AnsweringPipeline, PipelineConfig};
use bv_rag_rag::{
    HybridRetriever, PracticalKnowledgeIndex, QdrantVectorIndex, QueryClassifier, QueryEnhancer,
    RetrieverConfig, SparseConfig, TantivyLexicalIndex, UtilityStore, VectorStoreConfig,
};
use bv_rag_server::{create_router, init_metrics, AppState};

/// `PipelineConfig` fields with no corresponding setting: the orchestrator
/// fixes these at the values its own test fixture uses rather than
/// exposing them as tunables.
const COREFERENCE_RECENT_TURNS: usize = 6;
const KNOWLEDGE_MATCH_LIMIT: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("BV_RAG_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => {
            eprintln!("Loaded configuration (env: {})", env.as_deref().unwrap_or("default"));
            settings
        },
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        },
    };

    init_tracing(&settings);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting bv-rag-server");
    tracing::info!(environment = ?settings.environment, "configuration loaded");

    let settings = Arc::new(settings);

    let domain_tables_dir = PathBuf::from(&settings.domain_tables_dir);
    let tables = if domain_tables_dir.exists() {
        shared(DomainTables::load(&domain_tables_dir)?)
    } else {
        tracing::info!(dir = %domain_tables_dir.display(), "domain tables directory not found, using built-in defaults");
        shared(DomainTables::built_in())
    };

    let embedder: Arc<dyn bv_rag_core::Embedder> = Arc::new(HttpEmbedder::new(
        settings.rag.embedding_endpoint.clone(),
        settings.rag.vector_dim,
        bv_rag_config::constants::rag::EMBEDDING_TIMEOUT_SECS,
    )?);

    let vector_store_config = VectorStoreConfig {
        endpoint: settings.rag.qdrant_endpoint.clone(),
        collection: settings.rag.qdrant_collection.clone(),
        vector_dim: settings.rag.vector_dim,
        distance: bv_rag_rag::vector_store::VectorDistance::Cosine,
        api_key: settings.rag.qdrant_api_key.clone(),
    };
    let vector_index = Arc::new(QdrantVectorIndex::new(vector_store_config, embedder).await?);
    vector_index.ensure_collection().await?;
    tracing::info!(endpoint = %settings.rag.qdrant_endpoint, collection = %settings.rag.qdrant_collection, "qdrant vector index ready");

    let lexical_index = Arc::new(TantivyLexicalIndex::new(SparseConfig {
        index_path: Some(settings.rag.tantivy_index_dir.clone()),
        ..SparseConfig::default()
    })?);
    tracing::info!(dir = %settings.rag.tantivy_index_dir, "tantivy lexical index ready");

    let graph = Arc::new(PgReferenceGraphClient::connect(&settings.rag.postgres_url).await?);
    tracing::info!("reference graph client connected");

    let sessions: Arc<dyn SessionStore> =
        match RedisSessionStore::new(&settings.memory.redis_url, settings.memory.session_ttl_hours) {
            Ok(store) => {
                tracing::info!(redis_url = %settings.memory.redis_url, "redis session store ready");
                Arc::new(store)
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to reach redis, falling back to in-memory session store");
                Arc::new(InMemorySessionStore::new(settings.memory.session_ttl_hours))
            },
        };

    let utility_store = if settings.persistence.utility_store_enabled {
        match UtilityStore::connect(&settings.persistence.postgres_url, tables.clone()).await {
            Ok(store) => {
                tracing::info!("utility store connected");
                Some(Arc::new(store))
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to connect utility store, continuing without utility blending");
                None
            },
        }
    } else {
        tracing::info!("utility store disabled by configuration");
        None
    };

    let mut retriever_builder = HybridRetriever::new(
        RetrieverConfig {
            rrf_k: settings.rag.rrf_k,
            min_score: settings.rag.min_score,
            dynamic_top_k_delta: settings.rag.dynamic_top_k_delta,
            dynamic_top_k_ceiling: settings.rag.dynamic_top_k_ceiling,
            ..RetrieverConfig::default()
        },
        vector_index.clone(),
        lexical_index.clone(),
        tables.clone(),
    )
    .with_graph_client(graph.clone());
    if let Some(store) = &utility_store {
        retriever_builder = retriever_builder.with_utility_store(store.clone());
    }
    let retriever = Arc::new(retriever_builder);

    let classifier_for_pipeline = QueryClassifier::new(tables.clone());
    let enhancer_for_pipeline = QueryEnhancer::new(tables.clone());
    let classifier_for_search = Arc::new(QueryClassifier::new(tables.clone()));
    let enhancer_for_search = Arc::new(QueryEnhancer::new(tables.clone()));

    let knowledge_dir = PathBuf::from(&settings.knowledge_dir);
    let knowledge = Arc::new(if knowledge_dir.exists() {
        PracticalKnowledgeIndex::load_dir(&knowledge_dir).unwrap_or_else(|e| {
            tracing::warn!(error = %e, dir = %knowledge_dir.display(), "failed to load practical knowledge, starting empty");
            PracticalKnowledgeIndex::empty()
        })
    } else {
        tracing::info!(dir = %knowledge_dir.display(), "practical knowledge directory not found, starting empty");
        PracticalKnowledgeIndex::empty()
    });

    let primary_model: Arc<dyn bv_rag_core::ChatModel> = Arc::new(OllamaChatModel::new(
        ChatModelConfig::primary(settings.llm.primary_model.clone(), settings.llm.primary_endpoint.clone()),
    )?);
    let fast_model: Arc<dyn bv_rag_core::ChatModel> = Arc::new(OllamaChatModel::new(ChatModelConfig::fast(
        settings.llm.fast_model.clone(),
        settings.llm.fast_endpoint.clone(),
    ))?);

    let generator = Arc::new(AnswerGenerator::new(primary_model, fast_model.clone(), settings.llm.max_context_tokens));

    let speech_to_text: Arc<dyn bv_rag_core::SpeechToText> =
        Arc::new(HttpSpeechToText::new(settings.llm.stt_endpoint.clone(), settings.llm.speech_timeout_secs)?);
    let text_to_speech: Arc<dyn bv_rag_core::TextToSpeech> = Arc::new(HttpTextToSpeech::new(
        settings.llm.tts_endpoint.clone(),
        settings.llm.tts_audio_format.clone(),
        settings.llm.speech_timeout_secs,
    )?);

    let pipeline = Arc::new(AnsweringPipeline::new(
        tables.clone(),
        sessions.clone(),
        retriever.clone(),
        classifier_for_pipeline,
        enhancer_for_pipeline,
        knowledge,
        generator,
        fast_model,
        utility_store.clone(),
        PipelineConfig {
            max_conversation_turns: settings.memory.max_conversation_turns,
            summary_token_budget: settings.memory.summary_token_budget,
            coreference_recent_turns: COREFERENCE_RECENT_TURNS,
            knowledge_match_limit: KNOWLEDGE_MATCH_LIMIT,
        },
    ));

    let metrics_handle = init_metrics();
    tracing::info!("prometheus metrics installed at /metrics");

    let state = AppState::new(
        settings.clone(),
        tables,
        domain_tables_dir,
        pipeline,
        retriever,
        classifier_for_search,
        enhancer_for_search,
        graph,
        lexical_index,
        vector_index,
        sessions,
        utility_store,
        speech_to_text,
        text_to_speech,
        metrics_handle,
    );

    let app = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bv_rag={},tower_http=debug", settings.observability.log_filter).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
