//! Step 9 (§4.11): best-effort utility update, detached from the
//! response path on its own fire-and-forget task with its own timeout,
//! matching the teacher's background memory-summarization spawn in
//! `agent::process`.

use std::sync::Arc;
use std::time::Duration;

use bv_rag_config::constants::rag as rag_constants;
use bv_rag_core::{Confidence, QueryCategory};
use bv_rag_rag::{RankedHit, UtilityStore};

use crate::response::regulation_id;

/// Spawns the EMA update for every retrieved candidate. `was_cited` is
/// derived by comparing each candidate's `[Document Locator]` form
/// against the citations the generator actually extracted from the
/// answer text.
pub(crate) fn spawn(
    store: Option<Arc<UtilityStore>>,
    candidates: &[RankedHit],
    citations: &[String],
    confidence: Confidence,
    category: QueryCategory,
    is_refusal: bool,
) {
    let Some(store) = store else {
        tracing::debug!("utility store disabled, skipping step 9");
        return;
    };
    if candidates.is_empty() {
        return;
    }

    let updates: Vec<(String, bool)> = candidates
        .iter()
        .map(|hit| {
            let was_cited = regulation_id(hit).is_some_and(|id| citations.contains(&id));
            (hit.chunk_id.clone(), was_cited)
        })
        .collect();
    let confidence_str = confidence.as_str();

    tokio::spawn(async move {
        let deadline = Duration::from_secs(rag_constants::UTILITY_UPDATE_TIMEOUT_SECS);
        let outcome = tokio::time::timeout(deadline, async {
            for (chunk_id, was_cited) in updates {
                if let Err(e) =
                    store.record_outcome(&chunk_id, category, was_cited, confidence_str, is_refusal).await
                {
                    tracing::warn!(chunk_id = %chunk_id, error = %e, "utility update failed");
                }
            }
        })
        .await;

        if outcome.is_err() {
            tracing::warn!("utility update batch timed out, remaining chunks left unscored");
        }
    });
}
