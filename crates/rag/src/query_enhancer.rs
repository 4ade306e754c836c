//! Query Enhancer (C5)
//!
//! Five-stage deterministic pipeline over the raw utterance and the
//! classifier's `ShipInfo`: term expansion, topic hints, ship-type
//! hints, length thresholds, side detection. Each stage only adds to the
//! enhanced text and regulation hints; none of them remove anything.

use bv_rag_config::domain::SharedDomainTables;
use bv_rag_core::{EnhancedQuery, MatchedTerm, ShipInfo, TermSource};

pub struct QueryEnhancer {
    tables: SharedDomainTables,
}

impl QueryEnhancer {
    pub fn new(tables: SharedDomainTables) -> Self {
        Self { tables }
    }

    pub fn enhance(&self, query: &str, ship_info: &ShipInfo) -> EnhancedQuery {
        let tables = self.tables.read();
        let lower = query.to_lowercase();

        let mut matched_terms = Vec::new();
        let mut regulation_hints: Vec<String> = Vec::new();
        let mut additions: Vec<String> = Vec::new();

        // Stage 1: term expansion. Canonical terms present via any variant
        // get appended so downstream English-only lexical search still hits.
        let mut present_canonical: Vec<String> = Vec::new();
        for group in &tables.term_groups {
            if group.variants.iter().any(|v| lower.contains(&v.to_lowercase())) {
                present_canonical.push(group.canonical.clone());
                matched_terms.push(MatchedTerm {
                    term: group.canonical.clone(),
                    source: TermSource::Expansion,
                });
                additions.push(group.canonical.clone());
            }
        }

        // Stage 2: topic hints keyed off the canonical terms just surfaced.
        for hint in &tables.topic_hints {
            if present_canonical.iter().any(|c| c == &hint.trigger_term) {
                for reg in &hint.regulation_ids {
                    push_unique(&mut regulation_hints, reg.clone());
                }
            }
        }

        // Stage 3: ship-type hints require both a detected ship type and a
        // present domain keyword.
        if let Some(ship_type) = &ship_info.ship_type {
            for hint in &tables.ship_type_hints {
                if &hint.ship_type == ship_type && present_canonical.contains(&hint.domain_keyword)
                {
                    for reg in &hint.regulation_ids {
                        push_unique(&mut regulation_hints, reg.clone());
                    }
                    matched_terms.push(MatchedTerm {
                        term: hint.domain_keyword.clone(),
                        source: TermSource::ShipTypeHint,
                    });
                }
            }
        }

        // Stage 4: length thresholds require the length to meet-or-exceed
        // the rule's minimum and at least one required keyword present.
        if let Some(length) = ship_info.length_metres {
            for rule in &tables.length_thresholds {
                let keyword_present =
                    rule.required_keywords.iter().any(|k| present_canonical.contains(k));

                if length >= rule.min_length_metres && keyword_present {
                    for reg in &rule.regulation_ids {
                        push_unique(&mut regulation_hints, reg.clone());
                    }
                    additions.push(rule.literal_addition.clone());
                    matched_terms.push(MatchedTerm {
                        term: rule.literal_addition.clone(),
                        source: TermSource::LengthThreshold,
                    });
                }
            }
        }

        // Stage 5: side detection requires a side term in the raw query
        // plus a present domain keyword.
        for rule in &tables.side_detection_rules {
            let side_present = rule.side_terms.iter().any(|t| lower.contains(&t.to_lowercase()));
            let keyword_present =
                rule.domain_keywords.iter().any(|k| present_canonical.contains(k));

            if side_present && keyword_present {
                for reg in &rule.regulation_ids {
                    push_unique(&mut regulation_hints, reg.clone());
                }
                matched_terms.push(MatchedTerm {
                    term: "each side".to_string(),
                    source: TermSource::SideDetection,
                });
            }
        }

        // Join every stage's output into one pipe-delimited string so the
        // dense/lexical legs see the original wording plus every
        // expansion term and regulation hint, without the original
        // being swamped by either.
        let mut segments = vec![query.to_string()];
        if !additions.is_empty() {
            segments.push(additions.join(" "));
        }
        if !regulation_hints.is_empty() {
            segments.push(regulation_hints.join(" "));
        }
        let enhanced_text = segments.join(" | ");

        EnhancedQuery { enhanced_text, matched_terms, regulation_hints }
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_config::domain::{shared, DomainTables};

    fn enhancer() -> QueryEnhancer {
        QueryEnhancer::new(shared(DomainTables::built_in()))
    }

    /// End-to-end: a 100m cargo ship asking about liferafts on each side
    /// should thread through all five stages to SOLAS III/31.1.4.
    #[test]
    fn test_full_pipeline_liferaft_scenario() {
        let e = enhancer();
        let ship_info = ShipInfo {
            ship_type: Some("cargo ship".to_string()),
            length_metres: Some(100.0),
            tonnage: None,
        };

        let result = e.enhance("救生筏需要设置在两舷吗", &ship_info);

        assert!(result.regulation_hints.contains(&"SOLAS III/31.1.4".to_string()));
        assert!(result.regulation_hints.contains(&"SOLAS III/31".to_string()));
        assert!(result.regulation_hints.contains(&"SOLAS III Part B (cargo ships)".to_string()));
        assert!(result.enhanced_text.contains("85 metres"));
        assert!(result.enhanced_text.contains("liferaft"));
    }

    #[test]
    fn test_no_matches_returns_query_unchanged() {
        let e = enhancer();
        let result = e.enhance("hello there", &ShipInfo::default());
        assert_eq!(result.enhanced_text, "hello there");
        assert!(result.regulation_hints.is_empty());
    }
}
