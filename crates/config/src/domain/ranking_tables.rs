//! Authority-weight overrides and the utility EMA reward table (§4.6, §4.7).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reward for one `(was_cited, confidence)` combination, applied by the
/// EMA update rule `u <- 0.9*u + 0.1*reward`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardTable {
    pub cited_high: f32,
    pub cited_medium: f32,
    pub cited_low: f32,
    pub not_cited_high: f32,
    pub not_cited_medium: f32,
    pub not_cited_low: f32,
    /// Applied to every retrieved chunk, in place of the cited/not-cited
    /// rows above, when confidence is low and the answer is a refusal.
    pub refusal_low_confidence: f32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            cited_high: 1.0,
            cited_medium: 0.5,
            cited_low: 0.0,
            not_cited_high: -0.1,
            not_cited_medium: 0.0,
            not_cited_low: -0.3,
            refusal_low_confidence: -0.5,
        }
    }
}

impl RewardTable {
    /// `confidence` is one of `"high" | "medium" | "low"`, matching the
    /// closed confidence-label set.
    pub fn reward(&self, was_cited: bool, confidence: &str, is_refusal: bool) -> f32 {
        if confidence == "low" && is_refusal {
            return self.refusal_low_confidence;
        }
        match (was_cited, confidence) {
            (true, "high") => self.cited_high,
            (true, "medium") => self.cited_medium,
            (true, "low") => self.cited_low,
            (false, "high") => self.not_cited_high,
            (false, "medium") => self.not_cited_medium,
            (false, "low") => self.not_cited_low,
            _ => 0.0,
        }
    }
}

/// Authority-weight override table, keyed by `source_type`. Values
/// absent here fall back to `AuthorityLevel::weight()`'s fixed table, and
/// unknown `(source_type, authority_level)` pairs default to 0.6 at the
/// retriever call site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorityWeightOverrides {
    pub by_source_type: HashMap<String, f32>,
}

pub const UNKNOWN_AUTHORITY_DEFAULT_WEIGHT: f32 = 0.6;
