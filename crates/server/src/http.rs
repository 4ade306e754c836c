//! HTTP endpoints: voice/text answering, raw search, regulation lookup,
//! admin inspection, health/readiness and metrics.

use axum::{
    extract::{Form, Json, Multipart, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use base64::Engine;
use bv_rag_core::{
    Confidence, InputMode, ModelHint, PartialFailure, QueryClassification, ReferenceGraphClient, RequestTiming,
    RetrievalFilters, RetrievalStrategy,
};
use bv_rag_orchestrator::{AnswerRequest, SourceRef, VerifiedCitation};
use bv_rag_rag::{GraphContext, RankedHit};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::metrics::{record_pipeline_error, record_request};
use crate::state::AppState;
use crate::websocket::ws_handler;

pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_origins, state.settings.server.cors_enabled);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/voice/text-query", post(text_query))
        .route("/api/v1/voice/query", post(voice_query))
        .route("/api/v1/voice/tts", post(tts))
        .route("/api/v1/voice/ws/:session_id", get(ws_handler))
        .route("/api/v1/search", post(search))
        .route("/api/v1/regulation/:doc_id", get(get_regulation))
        .route("/api/v1/admin/stats", get(admin_stats))
        .route("/api/v1/admin/session/:session_id", get(admin_session))
        .route("/api/v1/admin/utility-stats", get(admin_utility_stats))
        .route("/api/v1/admin/reload-domain-config", post(reload_domain_config))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled, allowing all origins");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin, "invalid CORS origin, skipping");
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::error!("all configured CORS origins are invalid, falling back to localhost");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_credentials(true)
}

/// HTTP answer envelope, extending `bv_rag_orchestrator::AnswerResponse`
/// with the fields that only make sense at the transport boundary:
/// the input mode actually used, the STT transcript when input was
/// audio, and base64-encoded synthesized audio when the caller asked
/// for a spoken reply.
#[derive(Debug, Serialize)]
pub struct HttpAnswerResponse {
    pub session_id: Uuid,
    pub enhanced_query: String,
    pub answer_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_audio_base64: Option<String>,
    pub citations: Vec<VerifiedCitation>,
    pub confidence: Confidence,
    pub model_used: ModelHint,
    pub sources: Vec<SourceRef>,
    pub timing: RequestTiming,
    pub input_mode: InputMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
}

/// Form body shared by `/voice/text-query` (`text` carries the query
/// verbatim) and the non-audio fields of `/voice/query`.
#[derive(Debug, Deserialize)]
pub struct TextQueryForm {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub generate_audio: bool,
    #[serde(default = "default_input_mode")]
    pub input_mode: String,
}

fn default_input_mode() -> String {
    "text".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TtsResponse {
    pub audio_base64: String,
    pub audio_format: String,
}

async fn text_query(
    State(state): State<AppState>,
    Form(req): Form<TextQueryForm>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let response = run_pipeline(&state, req.session_id, req.user_id, req.text, InputMode::Text, None).await?;
    let response = maybe_synthesize(&state, response, req.generate_audio).await;
    record_request("voice_text_query", 200);
    Ok(Json(serde_json::to_value(response).unwrap_or_default()))
}

/// Multipart body: an `audio` file part plus the same optional form
/// fields as `/voice/text-query` (`session_id`, `user_id`,
/// `generate_audio`, `input_mode`).
async fn voice_query(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut audio: Option<Vec<u8>> = None;
    let mut session_id: Option<Uuid> = None;
    let mut user_id: Option<String> = None;
    let mut generate_audio = false;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                audio = Some(field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?.to_vec());
            },
            "session_id" => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                session_id = Uuid::parse_str(&text).ok();
            },
            "user_id" => {
                user_id = field.text().await.ok();
            },
            "generate_audio" => {
                let text = field.text().await.unwrap_or_default();
                generate_audio = text == "true" || text == "1";
            },
            _ => {
                let _ = field.bytes().await;
            },
        }
    }

    let audio = audio.ok_or(StatusCode::BAD_REQUEST)?;

    let transcript = state.speech_to_text.transcribe(&audio).await.map_err(|e| {
        tracing::error!(error = %e, "transcription failed");
        record_pipeline_error("stt");
        error_status(&e)
    })?;

    let response =
        run_pipeline(&state, session_id, user_id, transcript.clone(), InputMode::Voice, Some(transcript)).await?;
    let response = maybe_synthesize(&state, response, generate_audio).await;
    record_request("voice_query", 200);
    Ok(Json(serde_json::to_value(response).unwrap_or_default()))
}

async fn tts(State(state): State<AppState>, Form(req): Form<TtsRequest>) -> Result<Json<TtsResponse>, StatusCode> {
    let audio = state.text_to_speech.synthesize(&req.text).await.map_err(|e| {
        tracing::error!(error = %e, "speech synthesis failed");
        record_pipeline_error("tts");
        error_status(&e)
    })?;

    Ok(Json(TtsResponse {
        audio_base64: base64::engine::general_purpose::STANDARD.encode(audio),
        audio_format: state.text_to_speech.audio_format().to_string(),
    }))
}

#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    state: &AppState,
    session_id: Option<Uuid>,
    user_id: Option<String>,
    query: String,
    input_mode: InputMode,
    transcription: Option<String>,
) -> Result<HttpAnswerResponse, StatusCode> {
    let session_id = session_id.unwrap_or_else(Uuid::new_v4);
    let req = AnswerRequest { session_id, user_id, query, input_mode };

    let response = state
        .pipeline
        .answer(req, tokio_util::sync::CancellationToken::new())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "pipeline failed");
            record_pipeline_error("pipeline");
            error_status(&e)
        })?;

    Ok(to_http_response(response, input_mode, transcription))
}

/// Shared envelope builder: both the REST handlers and the WebSocket
/// handler produce the same `HttpAnswerResponse` shape from a pipeline
/// `AnswerResponse`.
pub(crate) fn to_http_response(
    response: bv_rag_orchestrator::AnswerResponse,
    input_mode: InputMode,
    transcription: Option<String>,
) -> HttpAnswerResponse {
    HttpAnswerResponse {
        session_id: response.session_id,
        enhanced_query: response.enhanced_query,
        answer_text: response.answer_text,
        answer_audio_base64: None,
        citations: response.citations,
        confidence: response.confidence,
        model_used: response.model_used,
        sources: response.sources,
        timing: response.timing,
        input_mode,
        transcription,
    }
}

async fn maybe_synthesize(state: &AppState, mut response: HttpAnswerResponse, synthesize: bool) -> HttpAnswerResponse {
    if !synthesize {
        return response;
    }
    match state.text_to_speech.synthesize(&response.answer_text).await {
        Ok(audio) => {
            response.answer_audio_base64 = Some(base64::engine::general_purpose::STANDARD.encode(audio));
        },
        Err(e) => {
            tracing::warn!(error = %e, "answer audio synthesis failed, returning text-only response");
        },
    }
    response
}

fn error_status(e: &bv_rag_core::Error) -> StatusCode {
    StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub document_filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub classification: QueryClassification,
    pub hits: Vec<SearchHit>,
    pub partial_failure: PartialFailure,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
    pub fused_score: f32,
    pub document: Option<String>,
    pub graph_context: Option<GraphContext>,
}

fn to_search_hit(hit: RankedHit) -> SearchHit {
    SearchHit {
        document: hit.metadata.get("document").cloned(),
        chunk_id: hit.chunk_id,
        text: hit.text,
        score: hit.score,
        fused_score: hit.fused_score,
        graph_context: hit.graph_context,
    }
}

/// Bypasses generation entirely: classifies, enhances and retrieves,
/// returning raw ranked hits. Useful for debugging retrieval quality
/// without paying for an LLM call.
async fn search(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> Json<SearchResponse> {
    let classification = state.classifier.classify(&req.query);
    let enhanced = state.enhancer.enhance(&req.query, &classification.ship_info);
    let (hits, partial_failure) = state
        .retriever
        .search(&enhanced, &classification, classification.top_k, RetrievalStrategy::Auto, &RetrievalFilters::default())
        .await;

    let hits: Vec<SearchHit> = hits
        .into_iter()
        .filter(|h| match (&req.document_filter, h.metadata.get("document")) {
            (Some(wanted), Some(doc)) => wanted == doc,
            (Some(_), None) => false,
            (None, _) => true,
        })
        .map(to_search_hit)
        .collect();

    Json(SearchResponse { classification, hits, partial_failure })
}

#[derive(Debug, Serialize)]
pub struct RegulationDetail {
    #[serde(flatten)]
    pub record: bv_rag_core::RegulationRecord,
    pub cross_references: Vec<bv_rag_core::CrossReference>,
    pub children: Vec<bv_rag_core::RegulationRecord>,
}

async fn get_regulation(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<RegulationDetail>, StatusCode> {
    let record = match state.graph.get_regulation(&doc_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, doc_id, "regulation lookup failed");
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        },
    };

    let cross_references = state.graph.get_cross_references(&doc_id).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, doc_id, "cross-reference lookup failed");
        Vec::new()
    });
    let children = state.graph.get_children(&doc_id).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, doc_id, "children lookup failed");
        Vec::new()
    });

    Ok(Json(RegulationDetail { record, cross_references, children }))
}

async fn admin_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let regulation_count = state.graph.count_regulations().await.ok();
    let chunk_count = state.lexical_index.doc_count();
    let vector_point_count = state.vector_index.collection_point_count().await.ok();
    let session_count = state.sessions.session_count().await;

    Json(serde_json::json!({
        "regulation_count": regulation_count,
        "lexical_chunk_count": chunk_count,
        "vector_point_count": vector_point_count,
        "session_count": session_count,
        "utility_store_enabled": state.utility_store.is_some(),
    }))
}

async fn admin_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<bv_rag_core::ConversationSession>, StatusCode> {
    match state.sessions.load(session_id).await {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, %session_id, "session lookup failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

async fn admin_utility_stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    let Some(store) = &state.utility_store else {
        return Ok(Json(serde_json::json!({ "enabled": false, "categories": [] })));
    };

    match store.category_stats().await {
        Ok(categories) => Ok(Json(serde_json::json!({ "enabled": true, "categories": categories }))),
        Err(e) => {
            tracing::error!(error = %e, "utility stats query failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

async fn reload_domain_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_domain_tables() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "success", "message": "domain tables reloaded" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "domain table reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "status": "error", "message": e.to_string() })))
        },
    }
}

async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let mut checks = serde_json::Map::new();
    let mut ready = true;

    let llm_url = format!("{}/api/tags", state.settings.llm.primary_endpoint);
    let llm_status = match tokio::time::timeout(std::time::Duration::from_secs(2), reqwest::get(&llm_url)).await {
        Ok(Ok(resp)) if resp.status().is_success() => "ok",
        Ok(Ok(_)) => {
            ready = false;
            "error"
        },
        Ok(Err(_)) => {
            ready = false;
            "unreachable"
        },
        Err(_) => {
            ready = false;
            "timeout"
        },
    };
    checks.insert("llm_backend".to_string(), serde_json::json!({ "status": llm_status, "url": llm_url }));

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(serde_json::json!({ "status": if ready { "ready" } else { "not_ready" }, "checks": checks })))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics_handle.render())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_permissive_when_disabled() {
        let layer = build_cors_layer(&[], false);
        let _ = layer;
    }
}
