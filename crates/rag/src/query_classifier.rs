//! Query Classifier (C4)
//!
//! Determines intent, extracts ship attributes from the raw utterance,
//! and derives the retrieval `top_k`/model hint the rest of the pipeline
//! uses. Pure function of the utterance plus the static tables in
//! `bv_rag_config::domain`; no I/O.

use bv_rag_config::domain::SharedDomainTables;
use bv_rag_core::{Intent, ModelHint, QueryClassification, ShipInfo};
use once_cell::sync::Lazy;
use regex::Regex;

static LENGTH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:m\b|metres?|meters?|米)").expect("valid regex")
});

static TONNAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:gt\b|gross tonnage|总吨)").expect("valid regex")
});

static REGULATION_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([A-Z][A-Za-z\-]{1,12}(?:\s?[IVX]+(?:-\d+)?)?/\d+(?:\.\d+)*)\b")
        .expect("valid regex")
});

pub struct QueryClassifier {
    tables: SharedDomainTables,
}

impl QueryClassifier {
    pub fn new(tables: SharedDomainTables) -> Self {
        Self { tables }
    }

    pub fn classify(&self, query: &str) -> QueryClassification {
        let lower = query.to_lowercase();

        let ship_info = self.extract_ship_info(&lower);

        let tables = self.tables.read();

        let mut intent = tables
            .intent_triggers
            .iter()
            .find(|(_, triggers)| triggers.triggers.iter().any(|t| lower.contains(&t.to_lowercase())))
            .map(|(name, _)| intent_from_name(name))
            .unwrap_or(Intent::Definition);

        let override_hit = tables
            .applicability_override_terms
            .iter()
            .any(|t| lower.contains(&t.to_lowercase()));

        if override_hit && (ship_info.ship_type.is_some() || ship_info.length_metres.is_some()) {
            intent = Intent::Applicability;
        }

        drop(tables);

        let concept_hint = REGULATION_REF_PATTERN
            .captures(query)
            .map(|c| c.get(1).unwrap().as_str().to_string());

        QueryClassification {
            top_k: intent.default_top_k(),
            model_hint: intent.default_model_hint(),
            intent,
            ship_info,
            concept_hint,
        }
    }

    fn extract_ship_info(&self, lower: &str) -> ShipInfo {
        let tables = self.tables.read();

        let mut ship_type = tables
            .ship_type_map
            .iter()
            .find(|(surface, _)| lower.contains(&surface.to_lowercase()))
            .map(|(_, canonical)| canonical.to_string());

        if ship_type.is_none()
            && tables
                .international_voyage_terms
                .iter()
                .any(|t| lower.contains(&t.to_lowercase()))
        {
            ship_type = Some("cargo ship".to_string());
        }

        let length_metres = LENGTH_PATTERN
            .captures(lower)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());

        let tonnage = TONNAGE_PATTERN
            .captures(lower)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());

        ShipInfo { ship_type, length_metres, tonnage }
    }
}

fn intent_from_name(name: &str) -> Intent {
    match name {
        "applicability" => Intent::Applicability,
        "comparison" => Intent::Comparison,
        "specification" => Intent::Specification,
        "procedure" => Intent::Procedure,
        "definition" => Intent::Definition,
        other => unreachable!("unknown intent name in domain table: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_config::domain::{shared, DomainTables};

    fn classifier() -> QueryClassifier {
        QueryClassifier::new(shared(DomainTables::built_in()))
    }

    #[test]
    fn test_applicability_override_with_length() {
        let c = classifier();
        let result = c.classify("A 100 metre cargo ship, is a liferaft required?");
        assert_eq!(result.intent, Intent::Applicability);
        assert_eq!(result.ship_info.ship_type.as_deref(), Some("cargo ship"));
        assert_eq!(result.ship_info.length_metres, Some(100.0));
    }

    #[test]
    fn test_procedure_intent() {
        let c = classifier();
        let result = c.classify("How to carry out an annual survey for liferafts?");
        assert_eq!(result.intent, Intent::Procedure);
    }

    #[test]
    fn test_concept_hint_extraction() {
        let c = classifier();
        let result = c.classify("What does SOLAS III/31 require for liferafts?");
        assert_eq!(result.concept_hint.as_deref(), Some("SOLAS III/31"));
    }

    #[test]
    fn test_international_voyage_defaults_to_cargo_ship() {
        let c = classifier();
        let result = c.classify("For a ship on international voyage, what applies?");
        assert_eq!(result.ship_info.ship_type.as_deref(), Some("cargo ship"));
    }
}
