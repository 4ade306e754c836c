//! Topic/ship-type/length/side regulation-hint tables, stages 2-5 of the
//! query enhancer (§4.5).

use serde::{Deserialize, Serialize};

/// Stage 2: a triggering term (matched after term expansion) adds one or
/// more regulation ids to the enhancer's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicHint {
    pub trigger_term: String,
    pub regulation_ids: Vec<String>,
}

pub fn default_topic_hints() -> Vec<TopicHint> {
    vec![
        TopicHint { trigger_term: "liferaft".into(), regulation_ids: vec!["SOLAS III".into(), "LSA Code".into()] },
        TopicHint { trigger_term: "lifeboat".into(), regulation_ids: vec!["SOLAS III".into(), "LSA Code".into()] },
        TopicHint { trigger_term: "fire control station".into(), regulation_ids: vec!["SOLAS II-2".into()] },
        TopicHint { trigger_term: "bulkhead".into(), regulation_ids: vec!["SOLAS II-2".into()] },
        TopicHint { trigger_term: "ballast water".into(), regulation_ids: vec!["MARPOL Annex I".into()] },
        TopicHint { trigger_term: "oil discharge".into(), regulation_ids: vec!["MARPOL Annex I".into()] },
        TopicHint { trigger_term: "sewage".into(), regulation_ids: vec!["MARPOL Annex IV".into()] },
        TopicHint { trigger_term: "garbage management".into(), regulation_ids: vec!["MARPOL Annex V".into()] },
        TopicHint { trigger_term: "sulphur content".into(), regulation_ids: vec!["MARPOL Annex VI".into()] },
        TopicHint { trigger_term: "structural fire protection".into(), regulation_ids: vec!["SOLAS II-2".into(), "FTP Code".into()] },
        TopicHint { trigger_term: "fixed fire-extinguishing system".into(), regulation_ids: vec!["SOLAS II-2".into(), "FSS Code".into()] },
        TopicHint { trigger_term: "navigation light".into(), regulation_ids: vec!["COLREG".into()] },
        TopicHint { trigger_term: "watertight subdivision".into(), regulation_ids: vec!["SOLAS II-1".into()] },
        TopicHint { trigger_term: "collision bulkhead".into(), regulation_ids: vec!["SOLAS II-1".into()] },
        TopicHint { trigger_term: "EPIRB".into(), regulation_ids: vec!["SOLAS IV".into()] },
        TopicHint { trigger_term: "SART".into(), regulation_ids: vec!["SOLAS IV".into()] },
    ]
}

/// Stage 3: a detected ship type combined with a domain keyword adds
/// ship-type-specific subsections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipTypeHint {
    pub ship_type: String,
    pub domain_keyword: String,
    pub regulation_ids: Vec<String>,
}

pub fn default_ship_type_hints() -> Vec<ShipTypeHint> {
    vec![
        ShipTypeHint {
            ship_type: "cargo ship".into(),
            domain_keyword: "lifesaving appliance".into(),
            regulation_ids: vec!["SOLAS III Part B (cargo ships)".into()],
        },
        ShipTypeHint {
            ship_type: "tanker".into(),
            domain_keyword: "fire integrity".into(),
            regulation_ids: vec!["SOLAS II-2 Reg 9/2.4 (tankers)".into()],
        },
        ShipTypeHint {
            ship_type: "passenger ship".into(),
            domain_keyword: "lifesaving appliance".into(),
            regulation_ids: vec!["SOLAS III Part B (passenger ships)".into()],
        },
    ]
}

/// Stage 4: a numeric length crossing an enumerated threshold, combined
/// with at least one required keyword, adds regulation ids plus a
/// literal threshold string to surface in the enhanced query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthThresholdRule {
    pub min_length_metres: f64,
    pub required_keywords: Vec<String>,
    pub regulation_ids: Vec<String>,
    pub literal_addition: String,
}

pub fn default_length_thresholds() -> Vec<LengthThresholdRule> {
    vec![
        LengthThresholdRule {
            min_length_metres: 85.0,
            required_keywords: vec!["lifesaving appliance".into(), "liferaft".into(), "lifeboat".into(), "davit-launched".into()],
            regulation_ids: vec!["SOLAS III/31".into()],
            literal_addition: "85 metres".into(),
        },
        LengthThresholdRule {
            min_length_metres: 24.0,
            required_keywords: vec!["lifesaving appliance".into()],
            regulation_ids: vec!["SOLAS III/1.3".into()],
            literal_addition: "24 metres".into(),
        },
    ]
}

/// Stage 5: bilateral/side-detection terms combined with a domain
/// keyword add side-specific regulation ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideDetectionRule {
    pub side_terms: Vec<String>,
    pub domain_keywords: Vec<String>,
    pub regulation_ids: Vec<String>,
}

pub fn default_side_detection_rules() -> Vec<SideDetectionRule> {
    vec![SideDetectionRule {
        side_terms: vec!["两舷".into(), "两边".into(), "each side".into(), "both sides".into()],
        domain_keywords: vec![
            "lifesaving appliance".into(),
            "liferaft".into(),
            "lifeboat".into(),
            "davit-launched".into(),
        ],
        regulation_ids: vec!["SOLAS III/31.1.4".into()],
    }]
}
