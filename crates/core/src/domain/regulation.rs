//! Regulation corpus types: the leaf records, their chunks, and the
//! relations that connect them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which kind of instrument a regulation record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Convention,
    Code,
    Resolution,
    Circular,
    Guideline,
    Specification,
    Conference,
}

/// Origin of a regulation record, independent of its `Collection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    ImoRules,
    BvRules,
    IacsUr,
    IacsUi,
    Other,
}

/// Authority level, used to weight candidates during fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityLevel {
    Convention,
    Resolution,
    IacsUr,
    IacsUi,
    ClassificationRule,
    GuidanceNote,
}

impl AuthorityLevel {
    /// Fixed multiplier applied to fused scores. Unknown combinations
    /// fall back to the guidance-note-adjacent default of 0.6 at the
    /// call site rather than here, since that default isn't a property
    /// of any single level.
    pub fn weight(self) -> f32 {
        match self {
            AuthorityLevel::Convention => 1.0,
            AuthorityLevel::IacsUr => 0.85,
            AuthorityLevel::ClassificationRule => 0.7,
            AuthorityLevel::IacsUi => 0.85,
            AuthorityLevel::Resolution => 0.8,
            AuthorityLevel::GuidanceNote => 0.5,
        }
    }
}

/// Page role within the source document's rendering, not a ranking signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Index,
    Content,
    Footnote,
    Collection,
}

/// A leaf node of a regulatory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationRecord {
    pub id: String,
    pub source_url: String,
    pub title: String,
    /// e.g. "SOLAS > Chapter II-1 > Regulation 3-6"
    pub breadcrumb: String,
    pub collection: Collection,
    pub document: String,
    pub chapter: Option<String>,
    pub part: Option<String>,
    pub regulation: Option<String>,
    pub paragraph: Option<String>,
    pub body: String,
    pub page_type: PageType,
    pub parent_id: Option<String>,
    pub source_type: SourceType,
    pub authority_level: AuthorityLevel,
}

/// Chunk type, drives per-document context-packing and filter matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Regulation,
    Table,
    TableCell,
    StructuredTable,
}

/// Ship-type inclusion/exclusion and other applicability constraints
/// attached to a chunk, used to catch branch mismatches at generation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    #[serde(default)]
    pub ship_types_included: Vec<String>,
    #[serde(default)]
    pub ship_types_excluded: Vec<String>,
    #[serde(default)]
    pub construction_date_condition: Option<String>,
}

/// Metadata mapping carried alongside chunk text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document: String,
    pub regulation: Option<String>,
    pub breadcrumb: String,
    pub url: String,
    pub title: String,
    pub chunk_type: Option<ChunkType>,
    pub applicability: Option<Applicability>,
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

/// Embeddable fragment of a `RegulationRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub regulation_id: String,
    pub raw_text: String,
    /// `raw_text` prefixed with breadcrumb and title.
    pub embedding_text: String,
    pub metadata: ChunkMetadata,
    pub token_count: usize,
}

impl Chunk {
    /// Builds `embedding_text` from `raw_text`, breadcrumb and title per
    /// the invariant that embedding text always begins with them.
    pub fn build_embedding_text(breadcrumb: &str, title: &str, raw_text: &str) -> String {
        format!("{breadcrumb} | {title}\n{raw_text}")
    }
}

/// Relation kind for a cross-reference edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    References,
    Interprets,
    Amends,
}

/// Directed edge `source_doc -> target_doc`. The target may be outside
/// the corpus; such dangling edges are kept but ignored for expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    pub source_doc: String,
    pub target_doc: String,
    pub anchor_text: String,
    pub context: String,
    pub relation: RelationKind,
}

/// Small controlled vocabulary entry (ship type, fire-safety, etc.)
/// linked many-to-many to regulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    pub regulation_ids: Vec<String>,
}

/// Per-chunk, per-category runtime utility row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkUtility {
    pub utility: f32,
    pub use_count: u32,
    pub success_count: u32,
    pub last_used_unix_ms: i64,
}

impl Default for ChunkUtility {
    fn default() -> Self {
        Self {
            utility: 0.5,
            use_count: 0,
            success_count: 0,
            last_used_unix_ms: 0,
        }
    }
}

/// Fixed category bucket a chunk utility row is keyed under, alongside
/// `chunk_id`. Assigned by keyword router in the utility store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    FireSafety,
    Lifesaving,
    Pollution,
    Stability,
    Structure,
    Machinery,
    Navigation,
    Survey,
    General,
}

impl QueryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryCategory::FireSafety => "fire_safety",
            QueryCategory::Lifesaving => "lifesaving",
            QueryCategory::Pollution => "pollution",
            QueryCategory::Stability => "stability",
            QueryCategory::Structure => "structure",
            QueryCategory::Machinery => "machinery",
            QueryCategory::Navigation => "navigation",
            QueryCategory::Survey => "survey",
            QueryCategory::General => "general",
        }
    }
}
