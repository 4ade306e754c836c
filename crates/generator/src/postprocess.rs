//! Post-processing (§4.10): citation extraction and confidence scoring.

use bv_rag_core::Confidence;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the bracketed citation form the system prompt mandates:
/// `[Document Reg/N.n.m]`.
static CITATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z][A-Za-z0-9 .\-]*?\s[A-Za-z0-9./\-]+)\]").expect("valid regex"));

/// Phrases the system prompt's rule 3 (insufficient-evidence refusal)
/// and rule 4 (branch-mismatch refusal) are expected to produce.
const REFUSAL_PHRASES: &[&str] = &[
    "insufficient evidence",
    "cannot confirm",
    "not enough information",
    "does not apply",
    "unable to confirm",
    "no matching regulation",
    "the retrieved passages do not",
];

pub fn extract_citations(answer_text: &str) -> Vec<String> {
    CITATION_PATTERN
        .captures_iter(answer_text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Whether the answer reads as a refusal, per the system prompt's rule 3
/// (insufficient evidence) and rule 4 (branch mismatch). Also usable by
/// callers that need the refusal signal on its own, e.g. to skip a
/// "was cited positively" utility update for a refused answer.
pub fn contains_refusal_phrase(answer_text: &str) -> bool {
    let lower = answer_text.to_lowercase();
    REFUSAL_PHRASES.iter().any(|p| lower.contains(p))
}

/// Confidence from the top candidate's combined score (§4.10), downgraded
/// from high to medium when the answer itself reads as a refusal.
pub fn compute_confidence(top_candidate_score: Option<f32>, answer_text: &str) -> Confidence {
    let mut confidence = Confidence::from_score(top_candidate_score.unwrap_or(0.0));
    if confidence == Confidence::High && contains_refusal_phrase(answer_text) {
        confidence = Confidence::Medium;
    }
    confidence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_citations_finds_bracketed_forms() {
        let text = "Liferafts are required [SOLAS III/31.1.4] and davits per [LSA Code 6.1.1].";
        let citations = extract_citations(text);
        assert_eq!(citations, vec!["SOLAS III/31.1.4", "LSA Code 6.1.1"]);
    }

    #[test]
    fn test_high_score_downgraded_on_refusal_phrase() {
        let confidence = compute_confidence(Some(0.95), "There is insufficient evidence to answer this.");
        assert_eq!(confidence, Confidence::Medium);
    }

    #[test]
    fn test_high_score_without_refusal_stays_high() {
        let confidence = compute_confidence(Some(0.95), "Liferafts are required [SOLAS III/31].");
        assert_eq!(confidence, Confidence::High);
    }

    #[test]
    fn test_no_candidates_is_low_confidence() {
        let confidence = compute_confidence(None, "No relevant regulation was retrieved.");
        assert_eq!(confidence, Confidence::Low);
    }
}
