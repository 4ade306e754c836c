//! Bilingual trigger lexicons and ship-attribute tables used by the
//! query classifier (§4.4).

use serde::{Deserialize, Serialize};

/// Chinese/English trigger words for one intent. The classifier picks
/// the first intent (by the fixed precedence order) with at least one
/// matching trigger present in the utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentTriggers {
    pub triggers: Vec<String>,
}

/// Trigger lexicons keyed by intent name, in the classifier's fixed
/// precedence order: applicability > comparison > specification >
/// procedure > definition.
pub fn default_intent_triggers() -> Vec<(&'static str, IntentTriggers)> {
    vec![
        (
            "applicability",
            IntentTriggers {
                triggers: vec![
                    "是否适用".into(), "适用于".into(), "需要".into(), "要求".into(), "应该".into(),
                    "does this apply".into(), "is required".into(), "applicable to".into(), "must".into(), "shall".into(),
                ],
            },
        ),
        (
            "comparison",
            IntentTriggers {
                triggers: vec![
                    "区别".into(), "不同".into(), "比较".into(), "哪个".into(),
                    "difference between".into(), "compare".into(), "versus".into(), "vs".into(),
                ],
            },
        ),
        (
            "specification",
            IntentTriggers {
                triggers: vec![
                    "是多少".into(), "尺寸".into(), "规格".into(), "数值".into(),
                    "what is the".into(), "how much".into(), "minimum".into(), "maximum".into(), "dimension".into(),
                ],
            },
        ),
        (
            "procedure",
            IntentTriggers {
                triggers: vec![
                    "如何".into(), "怎么".into(), "步骤".into(), "流程".into(),
                    "how to".into(), "procedure".into(), "steps".into(), "process".into(),
                ],
            },
        ),
        (
            "definition",
            IntentTriggers {
                triggers: vec![
                    "是什么意思".into(), "定义".into(), "含义".into(),
                    "what does".into(), "mean".into(), "definition of".into(),
                ],
            },
        ),
    ]
}

/// Override (§4.4): if both a ship-parameter term and one of these
/// requirement terms are present, intent is forced to `applicability`
/// regardless of earlier matches.
pub fn default_applicability_override_terms() -> Vec<String> {
    vec![
        "需要".into(), "要求".into(), "是否".into(),
        "required".into(), "shall".into(), "must".into(), "does this apply".into(),
    ]
}

/// Bilingual ship-type surface forms, mapped to a closed normalised
/// enumeration used to filter applicability metadata.
pub fn default_ship_type_map() -> Vec<(&'static str, &'static str)> {
    vec![
        ("货船", "cargo ship"),
        ("cargo ship", "cargo ship"),
        ("散货船", "bulk carrier"),
        ("bulk carrier", "bulk carrier"),
        ("油轮", "tanker"),
        ("液货船", "tanker"),
        ("油船", "tanker"),
        ("tanker", "tanker"),
        ("客船", "passenger ship"),
        ("passenger ship", "passenger ship"),
        ("集装箱船", "container ship"),
        ("container ship", "container ship"),
        ("FPSO", "fpso"),
        ("浮式生产储卸油装置", "fpso"),
    ]
}

/// Wording whose presence, combined with no explicit ship type, implies
/// `cargo ship` by default (§4.4: "international voyage" heuristic).
pub fn default_international_voyage_terms() -> Vec<String> {
    vec!["国际航行".into(), "international voyage".into()]
}
