//! Answer Generator (C10): model routing, context packing, prompt
//! assembly and post-processing around a single LLM call.
//!
//! This crate adds no failure modes of its own beyond what the chosen
//! `ChatModel::complete` call already surfaces as `bv_rag_core::Error`
//! (`GenerationUnavailable` on a model-call failure), so it carries no
//! crate-local error type — unlike `bv-rag-graph`/`bv-rag-memory`/
//! `bv-rag-llm`, which each wrap genuinely new I/O failure surfaces.

pub mod context;
pub mod postprocess;
pub mod router;

use std::sync::Arc;

use bv_rag_core::{
    ChatMessage, ChatModel, Confidence, EnhancedQuery, FinishReason, KnowledgeMatch, ModelHint,
    QueryClassification,
};
use bv_rag_rag::RankedHit;

pub use context::has_graph_interpretations;
pub use postprocess::contains_refusal_phrase;
pub use router::other_hint;

/// Everything the generator needs for a single answer, gathered by the
/// orchestrator (C11) from C4/C5/C7/C8/C9's outputs.
pub struct GenerationRequest<'a> {
    pub classification: &'a QueryClassification,
    pub enhanced: &'a EnhancedQuery,
    pub candidates: &'a [RankedHit],
    pub knowledge: &'a [KnowledgeMatch],
    pub conversation: &'a [ChatMessage],
    pub enhanced_query: &'a str,
    /// One-line summary of the user's most-queried regulations, when
    /// C9 has enough history to offer one.
    pub user_preferences: Option<&'a str>,
    pub has_graph_interpretations: bool,
}

#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub text: String,
    pub model_used: ModelHint,
    pub citations: Vec<String>,
    pub confidence: Confidence,
    pub finish_reason: FinishReason,
    pub total_time_ms: u64,
}

/// Owns one `ChatModel` handle per tier and decides, per request, which
/// one to call.
pub struct AnswerGenerator {
    primary: Arc<dyn ChatModel>,
    fast: Arc<dyn ChatModel>,
    max_context_tokens: usize,
}

impl AnswerGenerator {
    pub fn new(primary: Arc<dyn ChatModel>, fast: Arc<dyn ChatModel>, max_context_tokens: usize) -> Self {
        Self { primary, fast, max_context_tokens }
    }

    fn model_for(&self, hint: ModelHint) -> &Arc<dyn ChatModel> {
        match hint {
            ModelHint::Primary => &self.primary,
            ModelHint::Fast => &self.fast,
        }
    }

    /// Routes, packs context, calls the chosen model and post-processes
    /// the result. On a model-call failure the caller (C11) decides
    /// whether to retry with [`other_hint`] via [`Self::generate_with`].
    pub async fn generate(&self, req: GenerationRequest<'_>) -> bv_rag_core::Result<GeneratedAnswer> {
        let top_score = req.candidates.first().map(|c| c.score);
        let hint = router::route_model(req.classification, req.enhanced, top_score);
        self.generate_with(req, hint).await
    }

    pub async fn generate_with(
        &self,
        req: GenerationRequest<'_>,
        hint: ModelHint,
    ) -> bv_rag_core::Result<GeneratedAnswer> {
        let model = self.model_for(hint);
        tracing::debug!(model = model.model_name(), ?hint, "generating answer");
        let messages = context::pack_messages(&req, self.max_context_tokens, |t| model.estimate_tokens(t));

        let completion = model.complete(&messages).await?;

        let top_score = req.candidates.first().map(|c| c.score);
        let citations = postprocess::extract_citations(&completion.text);
        let confidence = postprocess::compute_confidence(top_score, &completion.text);

        Ok(GeneratedAnswer {
            text: completion.text,
            model_used: hint,
            citations,
            confidence,
            finish_reason: completion.finish_reason,
            total_time_ms: completion.total_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bv_rag_core::{ChatCompletion, EnhancedQuery, Intent, ShipInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubModel {
        name: &'static str,
        calls: AtomicUsize,
        reply: &'static str,
    }

    #[async_trait]
    impl ChatModel for StubModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> bv_rag_core::Result<ChatCompletion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatCompletion {
                text: self.reply.to_string(),
                total_time_ms: 5,
                finish_reason: FinishReason::Stop,
            })
        }

        fn model_name(&self) -> &str {
            self.name
        }
    }

    fn classification(intent: Intent) -> QueryClassification {
        QueryClassification {
            intent,
            top_k: intent.default_top_k(),
            model_hint: intent.default_model_hint(),
            ship_info: ShipInfo::default(),
            concept_hint: None,
        }
    }

    #[tokio::test]
    async fn test_generate_routes_to_fast_for_precise_regulation_query() {
        let primary = Arc::new(StubModel { name: "primary", calls: AtomicUsize::new(0), reply: "primary answer" });
        let fast = Arc::new(StubModel { name: "fast", calls: AtomicUsize::new(0), reply: "fast answer [SOLAS III/31]" });
        let generator = AnswerGenerator::new(primary.clone(), fast.clone(), 8192);

        let classification = classification(Intent::Specification);
        let enhanced = EnhancedQuery {
            enhanced_text: "What does SOLAS III/31 require?".into(),
            matched_terms: Vec::new(),
            regulation_hints: Vec::new(),
        };

        let req = GenerationRequest {
            classification: &classification,
            enhanced: &enhanced,
            candidates: &[],
            knowledge: &[],
            conversation: &[],
            enhanced_query: "What does SOLAS III/31 require?",
            user_preferences: None,
            has_graph_interpretations: false,
        };

        let answer = generator.generate(req).await.unwrap();
        assert_eq!(answer.model_used, ModelHint::Fast);
        assert_eq!(fast.calls.load(Ordering::SeqCst), 1);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
        assert_eq!(answer.citations, vec!["SOLAS III/31"]);
    }

    #[tokio::test]
    async fn test_generate_with_forces_the_other_model_on_retry() {
        let primary = Arc::new(StubModel { name: "primary", calls: AtomicUsize::new(0), reply: "primary answer" });
        let fast = Arc::new(StubModel { name: "fast", calls: AtomicUsize::new(0), reply: "fast answer" });
        let generator = AnswerGenerator::new(primary.clone(), fast.clone(), 8192);

        let classification = classification(Intent::Definition);
        let enhanced = EnhancedQuery {
            enhanced_text: "short query".into(),
            matched_terms: Vec::new(),
            regulation_hints: Vec::new(),
        };

        let req = GenerationRequest {
            classification: &classification,
            enhanced: &enhanced,
            candidates: &[],
            knowledge: &[],
            conversation: &[],
            enhanced_query: "short query",
            user_preferences: None,
            has_graph_interpretations: false,
        };

        let answer = generator.generate_with(req, other_hint(ModelHint::Fast)).await.unwrap();
        assert_eq!(answer.model_used, ModelHint::Primary);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }
}
