//! The fixed nine-step answering pipeline (§4.11), generalizing the
//! teacher's top-level `Agent::process` turn-handling flow: stage
//! dispatch with per-stage `tracing` and a `RequestTiming` map in place
//! of the teacher's ad hoc per-turn latency logging.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bv_rag_config::domain::SharedDomainTables;
use bv_rag_core::{
    ChatModel, ConversationSession, Error, PartialFailure, RequestTiming, Result, RetrievalFilters,
    RetrievalStrategy,
};
use bv_rag_generator::{router, AnswerGenerator, GenerationRequest};
use bv_rag_memory::{append_assistant_turn, append_user_turn, build_llm_context, SessionStore};
use bv_rag_rag::{HybridRetriever, PracticalKnowledgeIndex, QueryClassifier, QueryEnhancer, UtilityStore};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::response::{regulation_id, sources_from_candidates, AnswerRequest, AnswerResponse, VerifiedCitation};
use crate::utility_feedback;

pub struct PipelineConfig {
    pub max_conversation_turns: usize,
    pub summary_token_budget: usize,
    pub coreference_recent_turns: usize,
    pub knowledge_match_limit: usize,
}

pub struct AnsweringPipeline {
    tables: SharedDomainTables,
    sessions: Arc<dyn SessionStore>,
    retriever: Arc<HybridRetriever>,
    classifier: QueryClassifier,
    enhancer: QueryEnhancer,
    knowledge: Arc<PracticalKnowledgeIndex>,
    generator: Arc<AnswerGenerator>,
    fast_model: Arc<dyn ChatModel>,
    utility_store: Option<Arc<UtilityStore>>,
    config: PipelineConfig,
}

impl AnsweringPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tables: SharedDomainTables,
        sessions: Arc<dyn SessionStore>,
        retriever: Arc<HybridRetriever>,
        classifier: QueryClassifier,
        enhancer: QueryEnhancer,
        knowledge: Arc<PracticalKnowledgeIndex>,
        generator: Arc<AnswerGenerator>,
        fast_model: Arc<dyn ChatModel>,
        utility_store: Option<Arc<UtilityStore>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            tables,
            sessions,
            retriever,
            classifier,
            enhancer,
            knowledge,
            generator,
            fast_model,
            utility_store,
            config,
        }
    }

    /// Runs all nine steps for one request. Cancellation is checked at
    /// each stage boundary; the one piece of work allowed to outlive a
    /// cancelled request is the step 9 utility update, which runs on its
    /// own detached task regardless of how this call returns.
    pub async fn answer(&self, req: AnswerRequest, cancellation: CancellationToken) -> Result<AnswerResponse> {
        let mut timing = RequestTiming::new();
        let mut partial_failure = PartialFailure::default();

        // Step 1: load or create session.
        let t0 = Instant::now();
        let mut session = self.load_or_create(&req, &mut partial_failure).await;
        timing.record("session_load", t0.elapsed());
        check_cancelled(&cancellation)?;

        // Step 2: build context + coreference-resolved query. The
        // current turn is not yet in `session.turns`, so `conversation`
        // is exactly the prior history the generator should see.
        let t0 = Instant::now();
        let (conversation, enhanced_query) = build_llm_context(
            &self.tables,
            &session,
            &req.query,
            self.config.max_conversation_turns,
            self.config.summary_token_budget,
            Some(&self.fast_model),
            self.config.coreference_recent_turns,
        )
        .await;
        timing.record("context_build", t0.elapsed());
        check_cancelled(&cancellation)?;

        // Step 3: classify.
        let t0 = Instant::now();
        let classification = self.classifier.classify(&enhanced_query);
        timing.record("classify", t0.elapsed());

        // Step 4: enhance.
        let t0 = Instant::now();
        let enhanced = self.enhancer.enhance(&enhanced_query, &classification.ship_info);
        timing.record("enhance", t0.elapsed());
        check_cancelled(&cancellation)?;

        // Step 5: retrieve. All-legs-failure short-circuits before the
        // LLM is ever called, per the partial-failure policy.
        let t0 = Instant::now();
        let (candidates, retrieval_failures) = self
            .retriever
            .search(&enhanced, &classification, classification.top_k, RetrievalStrategy::Auto, &RetrievalFilters::default())
            .await;
        timing.record("retrieve", t0.elapsed());

        let vector_failed = retrieval_failures.failed_legs.iter().any(|l| l == "vector_index");
        let lexical_failed = retrieval_failures.failed_legs.iter().any(|l| l == "lexical_index");
        partial_failure.failed_legs.extend(retrieval_failures.failed_legs);
        partial_failure.messages.extend(retrieval_failures.messages);
        if vector_failed && lexical_failed {
            return Err(Error::RetrievalUnavailable);
        }
        check_cancelled(&cancellation)?;

        // Step 6: knowledge lookup.
        let t0 = Instant::now();
        let knowledge = self.knowledge.matches(
            &req.query,
            &enhanced,
            classification.ship_info.ship_type.as_deref(),
            self.config.knowledge_match_limit,
        );
        timing.record("knowledge", t0.elapsed());
        check_cancelled(&cancellation)?;

        // Step 7: generate, retrying once with the other model tier on
        // a `GenerationUnavailable` failure.
        let t0 = Instant::now();
        let has_graph_interpretations = bv_rag_generator::has_graph_interpretations(&candidates);
        let build_request = || GenerationRequest {
            classification: &classification,
            enhanced: &enhanced,
            candidates: &candidates,
            knowledge: &knowledge,
            conversation: &conversation,
            enhanced_query: &enhanced_query,
            user_preferences: None,
            has_graph_interpretations,
        };

        let top_score = candidates.first().map(|c| c.score);
        let hint = router::route_model(&classification, &enhanced, top_score);
        let generated = match self.generator.generate_with(build_request(), hint).await {
            Ok(answer) => answer,
            Err(Error::GenerationUnavailable(first_error)) => {
                tracing::warn!(model_hint = ?hint, error = %first_error, "generation failed, retrying with the other model");
                self.generator.generate_with(build_request(), router::other_hint(hint)).await?
            },
            Err(other) => return Err(other),
        };
        timing.record("generate", t0.elapsed());
        check_cancelled(&cancellation)?;

        // Step 8: append both turns, then persist. A store failure here
        // is logged but does not fail the response.
        let t0 = Instant::now();
        append_user_turn(&mut session, &req.query, req.input_mode, &self.tables, Utc::now());

        let retrieved_regulations: Vec<String> =
            candidates.iter().filter_map(regulation_id).collect();
        let mut metadata = HashMap::new();
        metadata.insert("retrieved_regulations".to_string(), serde_json::json!(retrieved_regulations));
        metadata.insert("citations".to_string(), serde_json::json!(generated.citations));
        metadata.insert("confidence".to_string(), serde_json::json!(generated.confidence.as_str()));
        metadata.insert("enhanced_query".to_string(), serde_json::json!(enhanced_query));
        append_assistant_turn(&mut session, &generated.text, metadata, Utc::now());

        if let Err(e) = self.sessions.store(&session).await {
            tracing::warn!(error = %e, "failed to persist session, response is returned regardless");
            partial_failure.record("session_store", e.to_string());
        }
        timing.record("session_store", t0.elapsed());

        // Step 9: best-effort utility update, fire-and-forget.
        let category = bv_rag_rag::retriever::default_category(&req.query);
        let is_refusal = bv_rag_generator::contains_refusal_phrase(&generated.text);
        utility_feedback::spawn(
            self.utility_store.clone(),
            &candidates,
            &generated.citations,
            generated.confidence,
            category,
            is_refusal,
        );

        // Step 10: response envelope.
        let citations = generated
            .citations
            .into_iter()
            .map(|citation| {
                let verified = retrieved_regulations.contains(&citation);
                VerifiedCitation { citation, verified }
            })
            .collect();

        Ok(AnswerResponse {
            session_id: req.session_id,
            enhanced_query,
            answer_text: generated.text,
            citations,
            confidence: generated.confidence,
            model_used: generated.model_used,
            sources: sources_from_candidates(&candidates),
            classification,
            timing,
            partial_failure,
        })
    }

    /// Loads the session, degrading to a fresh one on either a missing
    /// record or a session-store read failure (§5 partial-failure policy).
    async fn load_or_create(
        &self,
        req: &AnswerRequest,
        partial_failure: &mut PartialFailure,
    ) -> ConversationSession {
        match self.sessions.load(req.session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => ConversationSession::new(req.session_id, req.user_id.clone(), Utc::now()),
            Err(e) => {
                tracing::warn!(error = %e, "session store read failed, starting a fresh session");
                partial_failure.record("session_store", e.to_string());
                ConversationSession::new(req.session_id, req.user_id.clone(), Utc::now())
            },
        }
    }
}

fn check_cancelled(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}
