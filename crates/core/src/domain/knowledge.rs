//! Practical-knowledge entry types (C8 data model).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Surveyor-curated commentary keyed to regulations. Read-only at
/// request time, loaded once at boot from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticalKnowledgeEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub keywords: HashSet<String>,
    #[serde(default)]
    pub english_terms: HashSet<String>,
    #[serde(default)]
    pub regulation_ids: HashSet<String>,
    #[serde(default)]
    pub ship_types: HashSet<String>,
    pub common_mistake: Option<String>,
    pub correct_interpretation: Option<String>,
    pub typical_configurations: Option<String>,
    pub decision_tree: Option<String>,
}

impl PracticalKnowledgeEntry {
    /// Markdown block rendered for LLM context injection.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("### {}\n", self.title);
        if !self.regulation_ids.is_empty() {
            let mut ids: Vec<&str> = self.regulation_ids.iter().map(String::as_str).collect();
            ids.sort_unstable();
            out.push_str(&format!("Applicable regulations: {}\n", ids.join(", ")));
        }
        if let Some(ref interp) = self.correct_interpretation {
            out.push_str(&format!("Correct interpretation: {interp}\n"));
        }
        if let Some(ref mistake) = self.common_mistake {
            out.push_str(&format!("Common mistake: {mistake}\n"));
        }
        if let Some(ref cfg) = self.typical_configurations {
            out.push_str(&format!("Typical configurations: {cfg}\n"));
        }
        if let Some(ref tree) = self.decision_tree {
            out.push_str(&format!("Decision tree: {tree}\n"));
        }
        out
    }
}

/// A scored match returned by the practical-knowledge index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeMatch {
    pub entry: PracticalKnowledgeEntry,
    pub score: i32,
}
