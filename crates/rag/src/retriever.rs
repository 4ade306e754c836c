//! Hybrid Retriever (C7)
//!
//! Runs the dense, lexical and reference-graph legs concurrently, fuses
//! them with Reciprocal Rank Fusion, applies authority weighting and an
//! optional utility blend, and widens the result set when fusion comes
//! back thin. A `RetrievalStrategy` lets a caller bypass fusion outright
//! for an exact regulation-number lookup, or pin the call to one leg.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bv_rag_config::constants::rag as rag_constants;
use bv_rag_config::domain::SharedDomainTables;
use bv_rag_core::{
    AuthorityLevel, BackendHit, ChunkLookup, EnhancedQuery, PartialFailure, QueryCategory,
    QueryClassification, ReferenceGraphClient, RetrievalFilters, RetrievalStrategy, VectorIndexClient,
};

use crate::sparse_search::TantivyLexicalIndex;
use crate::utility_store::{categorize_query, UtilityStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Dense,
    Lexical,
    Graph,
    Hybrid,
}

/// Depth-1 graph context attached to a top-ranked hit after rerank:
/// parent-chain title, how many interpretive circulars point at it, and
/// whether it has been amended.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct GraphContext {
    pub parent_title: Option<String>,
    pub cross_reference_count: usize,
    pub interpretation_count: usize,
    pub has_amendments: bool,
}

#[derive(Debug, Clone)]
pub struct RankedHit {
    pub chunk_id: String,
    pub text: String,
    /// Final score after authority weighting and (if enabled) the
    /// utility blend; this is what candidates are sorted and cut on.
    pub score: f32,
    /// Score straight out of RRF fusion, before authority or utility
    /// adjust it. Kept alongside `score` so callers can tell how much
    /// of the final ranking came from reranking versus raw fusion.
    pub fused_score: f32,
    pub metadata: HashMap<String, String>,
    pub source: HitSource,
    pub graph_context: Option<GraphContext>,
}

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub dense_top_k: usize,
    pub lexical_top_k: usize,
    pub rrf_k: f32,
    pub min_score: f32,
    pub dynamic_top_k_delta: usize,
    pub dynamic_top_k_ceiling: usize,
    pub graph_expansion_top_n: usize,
    pub index_leg_timeout: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            dense_top_k: 20,
            lexical_top_k: 20,
            rrf_k: rag_constants::RRF_K,
            min_score: rag_constants::MIN_SCORE,
            dynamic_top_k_delta: rag_constants::DYNAMIC_TOP_K_DELTA,
            dynamic_top_k_ceiling: rag_constants::DYNAMIC_TOP_K_CEILING,
            graph_expansion_top_n: rag_constants::GRAPH_EXPANSION_TOP_N,
            index_leg_timeout: Duration::from_secs(rag_constants::INDEX_LEG_TIMEOUT_SECS),
        }
    }
}

/// Number of already-ranked hits that get the post-rerank graph-context
/// pass (§4.2 depth-1 expansion).
const POST_RERANK_EXPANSION_N: usize = 5;

pub struct HybridRetriever {
    config: RetrieverConfig,
    vector_client: Arc<dyn VectorIndexClient>,
    lexical_client: Arc<dyn bv_rag_core::LexicalIndexClient>,
    graph_client: Option<Arc<dyn ReferenceGraphClient>>,
    chunk_lookup: Option<Arc<dyn ChunkLookup>>,
    utility_store: Option<Arc<UtilityStore>>,
    tables: SharedDomainTables,
}

type LegResult = Result<bv_rag_core::Result<Vec<BackendHit>>, tokio::time::error::Elapsed>;
type LegFuture<'a> = Pin<Box<dyn Future<Output = LegResult> + Send + 'a>>;

impl HybridRetriever {
    pub fn new(
        config: RetrieverConfig,
        vector_client: Arc<dyn VectorIndexClient>,
        lexical_client: Arc<TantivyLexicalIndex>,
        tables: SharedDomainTables,
    ) -> Self {
        Self {
            config,
            vector_client,
            lexical_client,
            graph_client: None,
            chunk_lookup: None,
            utility_store: None,
            tables,
        }
    }

    pub fn with_graph_client(mut self, client: Arc<dyn ReferenceGraphClient>) -> Self {
        self.graph_client = Some(client);
        self
    }

    pub fn with_chunk_lookup(mut self, lookup: Arc<dyn ChunkLookup>) -> Self {
        self.chunk_lookup = Some(lookup);
        self
    }

    pub fn with_utility_store(mut self, store: Arc<UtilityStore>) -> Self {
        self.utility_store = Some(store);
        self
    }

    /// Runs the legs the resolved strategy calls for, fuses and weights
    /// them. Failures in individual legs are recorded in `PartialFailure`
    /// rather than aborting retrieval outright; total failure of all
    /// legs is the caller's responsibility to detect as
    /// `RetrievalUnavailable`.
    pub async fn search(
        &self,
        enhanced: &EnhancedQuery,
        classification: &QueryClassification,
        top_k: usize,
        strategy: RetrievalStrategy,
        filters: &RetrievalFilters,
    ) -> (Vec<RankedHit>, PartialFailure) {
        let mut failures = PartialFailure::default();
        let resolved = resolve_strategy(strategy, classification);

        let dense_fut: LegFuture = if matches!(resolved, RetrievalStrategy::Keyword) {
            empty_leg()
        } else {
            Box::pin(tokio::time::timeout(
                self.config.index_leg_timeout,
                self.vector_client.search(&enhanced.enhanced_text, self.config.dense_top_k, filters),
            ))
        };

        let lexical_fut: LegFuture = match resolved {
            RetrievalStrategy::Keyword => {
                let reference = classification
                    .concept_hint
                    .clone()
                    .or_else(|| enhanced.regulation_hints.first().cloned())
                    .unwrap_or_else(|| enhanced.enhanced_text.clone());
                let lexical = self.lexical_client.clone();
                Box::pin(tokio::time::timeout(self.config.index_leg_timeout, async move {
                    lexical.search_by_regulation_number(&reference).await
                }))
            },
            RetrievalStrategy::Semantic => empty_leg(),
            RetrievalStrategy::Hybrid | RetrievalStrategy::Auto => Box::pin(tokio::time::timeout(
                self.config.index_leg_timeout,
                self.lexical_client.search(&enhanced.enhanced_text, self.config.lexical_top_k, filters),
            )),
        };

        let graph_fut = self.graph_expand(enhanced, classification);

        let (dense_res, lexical_res, (graph_hits, graph_errors)) = tokio::join!(dense_fut, lexical_fut, graph_fut);

        for message in graph_errors {
            failures.record("reference_graph", message);
        }

        let dense_hits = match dense_res {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                failures.record("vector_index", e.to_string());
                Vec::new()
            },
            Err(_) => {
                failures.record("vector_index", "timed out".to_string());
                Vec::new()
            },
        };

        let lexical_hits = match lexical_res {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                failures.record("lexical_index", e.to_string());
                Vec::new()
            },
            Err(_) => {
                failures.record("lexical_index", "timed out".to_string());
                Vec::new()
            },
        };

        let mut fused = self.rrf_fuse(&dense_hits, &lexical_hits);

        if let Some(graph_hits) = graph_hits {
            self.merge_graph_hits(&mut fused, graph_hits);
        }

        self.apply_authority_weight(&mut fused);

        fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let utility_window = (2 * top_k).min(20).min(fused.len());
        self.blend_utility(enhanced, &mut fused[..utility_window]).await;

        fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let mut effective_top_k = top_k;
        if fused.iter().filter(|h| h.score >= self.config.min_score).count() < effective_top_k {
            effective_top_k = (effective_top_k + self.config.dynamic_top_k_delta).min(self.config.dynamic_top_k_ceiling);
        }

        let mut results: Vec<RankedHit> =
            fused.into_iter().filter(|h| h.score >= self.config.min_score).take(effective_top_k).collect();

        self.expand_top_ranked(&mut results, &mut failures).await;

        (results, failures)
    }

    fn rrf_fuse(&self, dense: &[BackendHit], lexical: &[BackendHit]) -> Vec<RankedHit> {
        let mut scores: HashMap<String, (f32, RankedHit)> = HashMap::new();

        for (rank, hit) in dense.iter().enumerate() {
            let rrf = 1.0 / (self.config.rrf_k + rank as f32 + 1.0);
            scores
                .entry(hit.chunk_id.clone())
                .and_modify(|(s, _)| *s += rrf)
                .or_insert((rrf, to_ranked(hit, HitSource::Dense)));
        }

        for (rank, hit) in lexical.iter().enumerate() {
            let rrf = 1.0 / (self.config.rrf_k + rank as f32 + 1.0);
            scores
                .entry(hit.chunk_id.clone())
                .and_modify(|(s, r)| {
                    *s += rrf;
                    r.source = HitSource::Hybrid;
                })
                .or_insert((rrf, to_ranked(hit, HitSource::Lexical)));
        }

        scores
            .into_iter()
            .map(|(_, (score, mut hit))| {
                hit.score = score;
                hit.fused_score = score;
                hit
            })
            .collect()
    }

    /// Depth-1 graph expansion seeded by the classifier's `concept_hint`
    /// or the top `graph_expansion_top_n` regulation hints, run as the
    /// third concurrent leg alongside dense/lexical search. Returns the
    /// expansion hits plus any per-seed error messages rather than
    /// recording them directly, since it runs inside a `tokio::join!`
    /// alongside the other two legs.
    async fn graph_expand(
        &self,
        enhanced: &EnhancedQuery,
        classification: &QueryClassification,
    ) -> (Option<Vec<RankedHit>>, Vec<String>) {
        let mut errors = Vec::new();

        let (Some(graph), Some(lookup)) = (self.graph_client.as_ref(), self.chunk_lookup.as_ref()) else {
            return (None, errors);
        };

        let mut seeds: Vec<String> = classification.concept_hint.iter().cloned().collect();
        seeds.extend(enhanced.regulation_hints.iter().take(self.config.graph_expansion_top_n).cloned());

        if seeds.is_empty() {
            return (None, errors);
        }

        let mut out = Vec::new();
        for seed in seeds {
            match graph.get_related_by_concept(&seed).await {
                Ok(records) => {
                    for record in records.into_iter().take(self.config.graph_expansion_top_n) {
                        if let Ok(Some(chunk)) = lookup.get_chunk(&record.id).await {
                            out.push(RankedHit {
                                chunk_id: chunk.chunk_id,
                                text: chunk.raw_text,
                                score: 0.0,
                                fused_score: 0.0,
                                metadata: HashMap::from([
                                    ("document".to_string(), record.document.clone()),
                                    ("source_type".to_string(), format!("{:?}", record.source_type)),
                                    (
                                        "authority_level".to_string(),
                                        format!("{:?}", record.authority_level),
                                    ),
                                ]),
                                source: HitSource::Graph,
                                graph_context: None,
                            });
                        }
                    }
                },
                Err(e) => errors.push(e.to_string()),
            }
        }

        (if out.is_empty() { None } else { Some(out) }, errors)
    }

    fn merge_graph_hits(&self, fused: &mut Vec<RankedHit>, graph_hits: Vec<RankedHit>) {
        let base_rank = fused.len();
        for (i, mut hit) in graph_hits.into_iter().enumerate() {
            if fused.iter().any(|f| f.chunk_id == hit.chunk_id) {
                continue;
            }
            let rrf = 1.0 / (self.config.rrf_k + (base_rank + i) as f32 + 1.0);
            hit.score = rrf;
            hit.fused_score = rrf;
            fused.push(hit);
        }
    }

    fn apply_authority_weight(&self, hits: &mut [RankedHit]) {
        let tables = self.tables.read();
        for hit in hits.iter_mut() {
            let weight = hit
                .metadata
                .get("source_type")
                .and_then(|st| tables.authority_overrides.by_source_type.get(st).copied())
                .or_else(|| {
                    hit.metadata.get("authority_level").and_then(|al| parse_authority(al).map(|a| a.weight()))
                })
                .unwrap_or(bv_rag_config::domain::UNKNOWN_AUTHORITY_DEFAULT_WEIGHT);

            hit.score *= weight;
        }
    }

    /// C6 utility rerank: blends each hit's fusion/authority score with
    /// its learned per-category utility. Only runs over the window
    /// passed in (the top `min(2*top_k, 20)` per §4.6), and is a no-op
    /// when no utility store is configured.
    async fn blend_utility(&self, enhanced: &EnhancedQuery, window: &mut [RankedHit]) {
        let Some(store) = self.utility_store.as_ref() else {
            return;
        };
        let category = categorize_query(&enhanced.enhanced_text);

        for hit in window.iter_mut() {
            if let Ok(utility) = store.get(&hit.chunk_id, category).await {
                hit.score = store.blend(hit.score, utility);
            }
        }
    }

    /// Post-rerank depth-1 graph expansion (§4.2): for the top already
    /// ranked hits, looks up cross-references, interpretations,
    /// amendments and the parent chain and attaches them as
    /// `graph_context`. In this schema a chunk's id and its regulation's
    /// id are the same string (see `graph_expand`'s own
    /// `lookup.get_chunk(&record.id)` call), so hits can be looked up in
    /// the graph directly by `chunk_id`.
    async fn expand_top_ranked(&self, hits: &mut [RankedHit], failures: &mut PartialFailure) {
        let Some(graph) = self.graph_client.as_ref() else {
            return;
        };

        let n = hits.len().min(POST_RERANK_EXPANSION_N);
        for hit in hits.iter_mut().take(n) {
            let parent_title = match graph.get_parent_chain(&hit.chunk_id).await {
                Ok(chain) => chain.last().map(|r| r.title.clone()),
                Err(e) => {
                    failures.record("reference_graph", e.to_string());
                    None
                },
            };

            let cross_reference_count = match graph.get_cross_references(&hit.chunk_id).await {
                Ok(refs) => refs.len(),
                Err(e) => {
                    failures.record("reference_graph", e.to_string());
                    0
                },
            };

            let interpretation_count = match graph.get_interpretations(&hit.chunk_id).await {
                Ok(refs) => refs.len(),
                Err(e) => {
                    failures.record("reference_graph", e.to_string());
                    0
                },
            };

            let has_amendments = match graph.get_amendments(&hit.chunk_id).await {
                Ok(refs) => !refs.is_empty(),
                Err(e) => {
                    failures.record("reference_graph", e.to_string());
                    false
                },
            };

            hit.graph_context =
                Some(GraphContext { parent_title, cross_reference_count, interpretation_count, has_amendments });
        }
    }
}

/// Resolves `Auto` against the classifier's concept hint; explicit
/// strategies pass through unchanged. Free function so it can be unit
/// tested without constructing a full `HybridRetriever`.
fn resolve_strategy(strategy: RetrievalStrategy, classification: &QueryClassification) -> RetrievalStrategy {
    match strategy {
        RetrievalStrategy::Auto => {
            if classification.concept_hint.is_some() {
                RetrievalStrategy::Keyword
            } else {
                RetrievalStrategy::Hybrid
            }
        },
        explicit => explicit,
    }
}

fn empty_leg<'a>() -> LegFuture<'a> {
    let empty: bv_rag_core::Result<Vec<BackendHit>> = Ok(Vec::new());
    Box::pin(async move { Ok(empty) })
}

fn to_ranked(hit: &BackendHit, source: HitSource) -> RankedHit {
    RankedHit {
        chunk_id: hit.chunk_id.clone(),
        text: hit.text.clone(),
        score: hit.score,
        fused_score: hit.score,
        metadata: hit.metadata.clone(),
        source,
        graph_context: None,
    }
}

fn parse_authority(s: &str) -> Option<AuthorityLevel> {
    match s {
        "Convention" => Some(AuthorityLevel::Convention),
        "Resolution" => Some(AuthorityLevel::Resolution),
        "IacsUr" => Some(AuthorityLevel::IacsUr),
        "IacsUi" => Some(AuthorityLevel::IacsUi),
        "ClassificationRule" => Some(AuthorityLevel::ClassificationRule),
        "GuidanceNote" => Some(AuthorityLevel::GuidanceNote),
        _ => None,
    }
}

pub fn default_category(query: &str) -> QueryCategory {
    categorize_query(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_core::{Intent, ModelHint, ShipInfo};

    #[test]
    fn test_config_default() {
        let config = RetrieverConfig::default();
        assert_eq!(config.rrf_k, 60.0);
        assert_eq!(config.dynamic_top_k_ceiling, 15);
    }

    fn classification(concept_hint: Option<&str>) -> QueryClassification {
        QueryClassification {
            intent: Intent::Specification,
            ship_info: ShipInfo::default(),
            top_k: 5,
            model_hint: ModelHint::Fast,
            concept_hint: concept_hint.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_strategy_auto_with_concept_hint_picks_keyword() {
        let resolved = resolve_strategy(RetrievalStrategy::Auto, &classification(Some("SOLAS III/31")));
        assert_eq!(resolved, RetrievalStrategy::Keyword);
    }

    #[test]
    fn test_resolve_strategy_auto_without_concept_hint_picks_hybrid() {
        let resolved = resolve_strategy(RetrievalStrategy::Auto, &classification(None));
        assert_eq!(resolved, RetrievalStrategy::Hybrid);
    }

    #[test]
    fn test_resolve_strategy_explicit_bypasses_auto_selection() {
        let resolved = resolve_strategy(RetrievalStrategy::Semantic, &classification(Some("SOLAS III/31")));
        assert_eq!(resolved, RetrievalStrategy::Semantic);
    }
}
