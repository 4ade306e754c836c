//! Model routing (§4.10 step 1-4): start from the classifier's hint,
//! then apply promotion/demotion rules. Promotion always wins.

use bv_rag_config::constants::generator::{DEMOTE_WORD_THRESHOLD, PROMOTE_LENGTH_THRESHOLD};
use bv_rag_core::{EnhancedQuery, Intent, ModelHint, QueryClassification};
use once_cell::sync::Lazy;
use regex::Regex;

static REGULATION_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([A-Z][A-Za-z\-]{1,12}(?:\s?[IVX]+(?:-\d+)?)?/\d+(?:\.\d+)*)\b")
        .expect("valid regex")
});

/// Bilingual words implying the query relates two things to each
/// other, used by the demotion rule's "no relation words" check. No
/// existing domain table covers this narrow a concern, so it lives
/// here rather than in `bv_rag_config::domain`.
const RELATION_WORDS: &[&str] = &[
    "between", "versus", "compare", "compared", "difference", "relation", "relationship", "than",
    "和", "与", "之间", "比较", "区别",
];

pub fn other_hint(hint: ModelHint) -> ModelHint {
    match hint {
        ModelHint::Primary => ModelHint::Fast,
        ModelHint::Fast => ModelHint::Primary,
    }
}

/// Picks `primary` or `fast` for a single generation call.
///
/// `top_candidate_score` is the highest combined retrieval score
/// across the packed candidates, or `None` when retrieval came back
/// empty.
pub fn route_model(
    classification: &QueryClassification,
    enhanced: &EnhancedQuery,
    top_candidate_score: Option<f32>,
) -> ModelHint {
    let comparison_keywords = classification.intent == Intent::Comparison;
    let ship_parameter = classification.ship_info.length_metres.is_some()
        || classification.ship_info.tonnage.is_some();
    let ship_type_keyword = classification.ship_info.ship_type.is_some();
    let applicability_keyword = classification.intent == Intent::Applicability;
    let long_query = enhanced.enhanced_text.chars().count() > PROMOTE_LENGTH_THRESHOLD;

    if comparison_keywords || ship_parameter || ship_type_keyword || applicability_keyword || long_query {
        return ModelHint::Primary;
    }

    let precise_regulation_identifier =
        classification.concept_hint.is_some() || REGULATION_REF_PATTERN.is_match(&enhanced.enhanced_text);
    let top_score_high = top_candidate_score.is_some_and(|s| s > 0.75);
    let word_count = enhanced.enhanced_text.split_whitespace().count();
    let short_with_no_relation = word_count < DEMOTE_WORD_THRESHOLD
        && !RELATION_WORDS.iter().any(|w| enhanced.enhanced_text.to_lowercase().contains(w));

    if precise_regulation_identifier || top_score_high || short_with_no_relation {
        return ModelHint::Fast;
    }

    classification.model_hint
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_core::ShipInfo;

    fn classification(intent: Intent, ship_info: ShipInfo) -> QueryClassification {
        QueryClassification {
            intent,
            top_k: intent.default_top_k(),
            model_hint: intent.default_model_hint(),
            ship_info,
            concept_hint: None,
        }
    }

    fn enhanced(text: &str) -> EnhancedQuery {
        EnhancedQuery {
            enhanced_text: text.to_string(),
            matched_terms: Vec::new(),
            regulation_hints: Vec::new(),
        }
    }

    #[test]
    fn test_ship_parameter_promotes_to_primary() {
        let c = classification(
            Intent::Specification,
            ShipInfo { ship_type: None, length_metres: Some(100.0), tonnage: None },
        );
        let hint = route_model(&c, &enhanced("minimum freeboard"), None);
        assert_eq!(hint, ModelHint::Primary);
    }

    #[test]
    fn test_precise_regulation_identifier_demotes_to_fast() {
        let c = classification(Intent::Specification, ShipInfo::default());
        let hint = route_model(&c, &enhanced("What does SOLAS III/31 require?"), None);
        assert_eq!(hint, ModelHint::Fast);
    }

    #[test]
    fn test_promotion_takes_precedence_over_demotion() {
        let c = classification(
            Intent::Applicability,
            ShipInfo { ship_type: None, length_metres: Some(50.0), tonnage: None },
        );
        let hint = route_model(&c, &enhanced("SOLAS III/31 applicability"), Some(0.9));
        assert_eq!(hint, ModelHint::Primary);
    }

    #[test]
    fn test_no_signals_falls_back_to_classifier_hint() {
        let c = classification(Intent::Procedure, ShipInfo::default());
        // 15 words, 44 chars, no regulation id, no relation words: neither
        // the promote nor the demote rule fires, so the router keeps C4's
        // default hint for this intent (`fast`).
        let hint = route_model(&c, &enhanced("a to be in on is it at so we if he she it ok"), None);
        assert_eq!(hint, ModelHint::Fast);
        assert_eq!(hint, c.model_hint);
    }
}
