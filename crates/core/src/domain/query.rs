//! Query understanding types shared by the classifier, enhancer and
//! retriever (C4/C5/C7 data model).

use serde::{Deserialize, Serialize};

/// Fixed intent precedence: `applicability > comparison > specification
/// > procedure > definition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Applicability,
    Comparison,
    Specification,
    Procedure,
    Definition,
}

impl Intent {
    /// Default `top_k` for this intent (§4.4).
    pub fn default_top_k(self) -> usize {
        match self {
            Intent::Applicability => 12,
            Intent::Specification => 5,
            Intent::Procedure => 8,
            Intent::Comparison => 10,
            Intent::Definition => 5,
        }
    }

    pub fn default_model_hint(self) -> ModelHint {
        match self {
            Intent::Applicability | Intent::Comparison => ModelHint::Primary,
            Intent::Specification | Intent::Procedure | Intent::Definition => ModelHint::Fast,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelHint {
    Fast,
    Primary,
}

/// Ship attributes extracted from the raw utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipInfo {
    pub ship_type: Option<String>,
    pub length_metres: Option<f64>,
    pub tonnage: Option<f64>,
}

/// Output of the query classifier (C4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryClassification {
    pub intent: Intent,
    pub ship_info: ShipInfo,
    pub top_k: usize,
    pub model_hint: ModelHint,
    /// Regulation/concept name the classifier matched directly, seeds
    /// the graph-expansion leg in the retriever.
    pub concept_hint: Option<String>,
}

/// Source of a matched expansion term, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermSource {
    Expansion,
    TopicHint,
    ShipTypeHint,
    LengthThreshold,
    SideDetection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedTerm {
    pub term: String,
    pub source: TermSource,
}

/// Output of the query enhancer (C5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedQuery {
    pub enhanced_text: String,
    pub matched_terms: Vec<MatchedTerm>,
    pub regulation_hints: Vec<String>,
}

/// Which retrieval strategy a hybrid-retriever call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    Auto,
    Keyword,
    Semantic,
    Hybrid,
}

/// Equality filters accepted by the vector and lexical index clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalFilters {
    pub document: Option<String>,
    pub collection: Option<String>,
    pub source_type: Option<String>,
    pub chunk_type: Option<String>,
}

/// Confidence label attached to a generated answer. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }

    pub fn from_score(score: f32) -> Self {
        if score > 0.85 {
            Confidence::High
        } else if score > 0.60 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}
