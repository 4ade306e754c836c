//! Static query-understanding and ranking tables (§4.4-§4.7, §4.9),
//! loaded once at startup as immutable data and swapped atomically on
//! reload rather than mutated in place.

mod classifier_tables;
mod coreference;
mod query_hints;
mod ranking_tables;
mod tables;
mod term_expansion;

pub use classifier_tables::{
    default_applicability_override_terms, default_international_voyage_terms,
    default_intent_triggers, default_ship_type_map, IntentTriggers,
};
pub use coreference::default_pronoun_patterns;
pub use query_hints::{
    default_length_thresholds, default_ship_type_hints, default_side_detection_rules,
    default_topic_hints, LengthThresholdRule, ShipTypeHint, SideDetectionRule, TopicHint,
};
pub use ranking_tables::{AuthorityWeightOverrides, RewardTable, UNKNOWN_AUTHORITY_DEFAULT_WEIGHT};
pub use tables::{shared, DomainTables, SharedDomainTables};
pub use term_expansion::{default_term_groups, TermGroup};
