//! Aggregate immutable domain-table bundle, loaded once at startup and
//! swapped atomically on reload (never mutated in place, §9).

use std::path::Path;
use std::sync::Arc;

use super::classifier_tables::{
    default_applicability_override_terms, default_intent_triggers,
    default_international_voyage_terms, default_ship_type_map, IntentTriggers,
};
use super::coreference::default_pronoun_patterns;
use super::query_hints::{
    default_length_thresholds, default_side_detection_rules, default_ship_type_hints,
    default_topic_hints, LengthThresholdRule, ShipTypeHint, SideDetectionRule, TopicHint,
};
use super::ranking_tables::{AuthorityWeightOverrides, RewardTable};
use super::term_expansion::{default_term_groups, TermGroup};
use crate::ConfigError;

/// All static query-understanding and ranking tables, bundled so the
/// whole set can be reloaded atomically.
#[derive(Debug, Clone)]
pub struct DomainTables {
    pub term_groups: Vec<TermGroup>,
    pub topic_hints: Vec<TopicHint>,
    pub ship_type_hints: Vec<ShipTypeHint>,
    pub length_thresholds: Vec<LengthThresholdRule>,
    pub side_detection_rules: Vec<SideDetectionRule>,
    pub intent_triggers: Vec<(&'static str, IntentTriggers)>,
    pub applicability_override_terms: Vec<String>,
    pub international_voyage_terms: Vec<String>,
    pub ship_type_map: Vec<(&'static str, &'static str)>,
    pub pronoun_patterns: Vec<String>,
    pub reward_table: RewardTable,
    pub authority_overrides: AuthorityWeightOverrides,
}

impl DomainTables {
    pub fn built_in() -> Self {
        Self {
            term_groups: default_term_groups(),
            topic_hints: default_topic_hints(),
            ship_type_hints: default_ship_type_hints(),
            length_thresholds: default_length_thresholds(),
            side_detection_rules: default_side_detection_rules(),
            intent_triggers: default_intent_triggers(),
            applicability_override_terms: default_applicability_override_terms(),
            international_voyage_terms: default_international_voyage_terms(),
            ship_type_map: default_ship_type_map(),
            pronoun_patterns: default_pronoun_patterns(),
            reward_table: RewardTable::default(),
            authority_overrides: AuthorityWeightOverrides::default(),
        }
    }

    /// Loads the built-in tables, applying YAML overrides from `dir` when
    /// present. Missing or unparsable override files fall back to the
    /// built-in defaults for that table and log a warning, matching the
    /// non-fatal degrade-to-defaults pattern used elsewhere at boot.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut tables = Self::built_in();

        let rewards_path = dir.join("reward_table.yaml");
        if rewards_path.exists() {
            match std::fs::read_to_string(&rewards_path)
                .map_err(|e| ConfigError::ParseError(e.to_string()))
                .and_then(|s| serde_yaml::from_str::<RewardTable>(&s).map_err(|e| ConfigError::ParseError(e.to_string())))
            {
                Ok(table) => tables.reward_table = table,
                Err(e) => tracing::warn!(error = %e, path = %rewards_path.display(), "falling back to built-in reward table"),
            }
        }

        let authority_path = dir.join("authority_weights.yaml");
        if authority_path.exists() {
            match std::fs::read_to_string(&authority_path)
                .map_err(|e| ConfigError::ParseError(e.to_string()))
                .and_then(|s| serde_yaml::from_str::<AuthorityWeightOverrides>(&s).map_err(|e| ConfigError::ParseError(e.to_string())))
            {
                Ok(table) => tables.authority_overrides = table,
                Err(e) => tracing::warn!(error = %e, path = %authority_path.display(), "falling back to built-in authority weights"),
            }
        }

        Ok(tables)
    }
}

/// Shared handle to the currently-active domain tables. `ArcSwap`-style
/// reload would be preferable under heavy write contention, but reloads
/// here are rare (deployment-triggered), so a plain `RwLock` is enough.
pub type SharedDomainTables = Arc<parking_lot::RwLock<DomainTables>>;

pub fn shared(tables: DomainTables) -> SharedDomainTables {
    Arc::new(parking_lot::RwLock::new(tables))
}
