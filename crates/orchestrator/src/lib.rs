//! Pipeline Orchestrator (C11): the fixed nine-step sequence that ties
//! session memory (C9), query understanding (C4/C5), hybrid retrieval
//! (C7), practical knowledge (C8) and answer generation (C10) into one
//! request/response round trip.
//!
//! Every step's failure either converts into a `bv_rag_core::Error`
//! already defined by an inner crate, or degrades per §5's
//! partial-failure policy, so this crate carries no error type of its
//! own — the same reasoning `bv-rag-generator` uses.

mod pipeline;
mod response;
mod utility_feedback;

pub use pipeline::{AnsweringPipeline, PipelineConfig};
pub use response::{AnswerRequest, AnswerResponse, SourceRef, VerifiedCitation};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bv_rag_config::domain::{shared, DomainTables};
    use bv_rag_core::{
        BackendHit, ChatCompletion, ChatMessage, ChatModel, FinishReason, InputMode, RetrievalFilters,
        VectorIndexClient,
    };
    use bv_rag_memory::InMemorySessionStore;
    use bv_rag_rag::{
        HybridRetriever, PracticalKnowledgeIndex, QueryClassifier, QueryEnhancer, RetrieverConfig,
        SparseConfig, TantivyLexicalIndex,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    struct StubModel {
        reply: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for StubModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> bv_rag_core::Result<ChatCompletion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatCompletion {
                text: self.reply.to_string(),
                total_time_ms: 1,
                finish_reason: FinishReason::Stop,
            })
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    struct StubVectorIndex;

    #[async_trait]
    impl VectorIndexClient for StubVectorIndex {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
            _filters: &RetrievalFilters,
        ) -> bv_rag_core::Result<Vec<BackendHit>> {
            let mut metadata = HashMap::new();
            metadata.insert("document".to_string(), "SOLAS".to_string());
            metadata.insert("regulation".to_string(), "III/31".to_string());
            metadata.insert("breadcrumb".to_string(), "SOLAS > III > 31".to_string());
            metadata.insert("url".to_string(), "https://example/solas-iii-31".to_string());
            Ok(vec![BackendHit {
                chunk_id: "c1".into(),
                text: "Liferafts shall be provided for all persons on board.".into(),
                score: 0.95,
                metadata,
            }])
        }
    }

    fn pipeline(reply: &'static str) -> AnsweringPipeline {
        let tables = shared(DomainTables::built_in());

        let retriever = Arc::new(HybridRetriever::new(
            RetrieverConfig::default(),
            Arc::new(StubVectorIndex),
            Arc::new(TantivyLexicalIndex::new(SparseConfig::default()).unwrap()),
            tables.clone(),
        ));

        let generator_primary = Arc::new(StubModel { reply, calls: AtomicUsize::new(0) });
        let generator_fast = Arc::new(StubModel { reply, calls: AtomicUsize::new(0) });
        let generator = Arc::new(bv_rag_generator::AnswerGenerator::new(generator_primary, generator_fast, 8192));

        let fast_model: Arc<dyn ChatModel> = Arc::new(StubModel { reply: "ignored", calls: AtomicUsize::new(0) });

        AnsweringPipeline::new(
            tables.clone(),
            Arc::new(InMemorySessionStore::new(24)),
            retriever,
            QueryClassifier::new(tables.clone()),
            QueryEnhancer::new(tables.clone()),
            Arc::new(PracticalKnowledgeIndex::empty()),
            generator,
            fast_model,
            None,
            PipelineConfig {
                max_conversation_turns: 10,
                summary_token_budget: 200,
                coreference_recent_turns: 6,
                knowledge_match_limit: 3,
            },
        )
    }

    #[tokio::test]
    async fn test_answer_produces_response_with_citation() {
        let pipeline = pipeline("Liferafts are required for all persons on board [SOLAS III/31].");
        let req = AnswerRequest {
            session_id: Uuid::new_v4(),
            user_id: None,
            query: "How many liferafts are required?".to_string(),
            input_mode: InputMode::Text,
        };

        let response = pipeline.answer(req, CancellationToken::new()).await.unwrap();
        assert!(response.answer_text.contains("Liferafts"));
        assert_eq!(response.citations.len(), 1);
        assert!(response.citations[0].verified);
        assert!(!response.sources.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let pipeline = pipeline("unused");
        let req = AnswerRequest {
            session_id: Uuid::new_v4(),
            user_id: None,
            query: "anything".to_string(),
            input_mode: InputMode::Text,
        };
        let token = CancellationToken::new();
        token.cancel();

        let result = pipeline.answer(req, token).await;
        assert!(matches!(result, Err(bv_rag_core::Error::Cancelled)));
    }
}
