//! Request/response envelope for a single pipeline run (§4.11, §6).

use bv_rag_core::{Confidence, InputMode, ModelHint, PartialFailure, QueryClassification, RequestTiming};
use bv_rag_rag::RankedHit;
use serde::Serialize;
use uuid::Uuid;

/// A single incoming query, already transcribed if it arrived as audio.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub session_id: Uuid,
    pub user_id: Option<String>,
    pub query: String,
    pub input_mode: InputMode,
}

/// One citation as it appeared in the generated answer, alongside
/// whether it matches a regulation id actually present in the
/// retrieved candidates.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedCitation {
    pub citation: String,
    pub verified: bool,
}

/// One retrieved source as surfaced to the caller, independent of
/// whatever internal `RankedHit` fields the retriever happened to fill.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub chunk_id: String,
    pub url: String,
    pub breadcrumb: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub session_id: Uuid,
    pub enhanced_query: String,
    pub answer_text: String,
    pub citations: Vec<VerifiedCitation>,
    pub confidence: Confidence,
    pub model_used: ModelHint,
    pub sources: Vec<SourceRef>,
    pub classification: QueryClassification,
    pub timing: RequestTiming,
    pub partial_failure: PartialFailure,
}

/// `[Document Locator]`-style regulation id for a candidate, when its
/// metadata carries both fields. Matches the generator's citation
/// regex output, so callers can check "was this chunk actually cited"
/// by a plain string comparison.
pub(crate) fn regulation_id(hit: &RankedHit) -> Option<String> {
    let document = hit.metadata.get("document").filter(|d| !d.is_empty())?;
    let locator = hit.metadata.get("regulation").filter(|r| !r.is_empty())?;
    Some(format!("{document} {locator}"))
}

pub(crate) fn sources_from_candidates(candidates: &[RankedHit]) -> Vec<SourceRef> {
    candidates
        .iter()
        .map(|c| SourceRef {
            chunk_id: c.chunk_id.clone(),
            url: c.metadata.get("url").cloned().unwrap_or_default(),
            breadcrumb: c.metadata.get("breadcrumb").cloned().unwrap_or_default(),
            score: c.score,
        })
        .collect()
}
