//! Practical-Knowledge Index (C8)
//!
//! Surveyor-curated commentary (common mistakes, typical configurations,
//! decision trees) keyed to regulations, loaded once at boot from YAML
//! and matched in memory against the enhanced query. Not a search
//! index proper: the corpus is small enough that a linear keyword-overlap
//! scorer is sufficient, matching the directory-scan/fallback-to-empty
//! loading shape used elsewhere at startup.

use std::path::Path;

use bv_rag_core::{EnhancedQuery, KnowledgeMatch, PracticalKnowledgeEntry};
use serde::{Deserialize, Serialize};

use crate::error::RagError;

#[derive(Debug, Serialize, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    entries: Vec<PracticalKnowledgeEntry>,
}

pub struct PracticalKnowledgeIndex {
    entries: Vec<PracticalKnowledgeEntry>,
}

impl PracticalKnowledgeIndex {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Loads every `.yaml`/`.yml`/`.json` file under `dir`. A missing
    /// directory degrades to an empty index rather than erroring, since
    /// practical-knowledge commentary is supplementary context, not a
    /// required corpus.
    pub fn load_dir(dir: &Path) -> Result<Self, RagError> {
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "practical knowledge directory does not exist, starting empty");
            return Ok(Self::empty());
        }

        let mut entries = Vec::new();

        for entry in std::fs::read_dir(dir).map_err(|e| RagError::Other(e.to_string()))? {
            let entry = entry.map_err(|e| RagError::Other(e.to_string()))?;
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !matches!(ext, "yaml" | "yml" | "json") {
                continue;
            }

            let content = std::fs::read_to_string(&path).map_err(|e| RagError::Other(e.to_string()))?;
            let file: KnowledgeFile = match ext {
                "json" => serde_json::from_str(&content)
                    .map_err(|e| RagError::Other(format!("{}: {e}", path.display())))?,
                _ => serde_yaml::from_str(&content)
                    .map_err(|e| RagError::Other(format!("{}: {e}", path.display())))?,
            };

            entries.extend(file.entries);
        }

        tracing::info!(count = entries.len(), path = %dir.display(), "loaded practical knowledge entries");
        Ok(Self { entries })
    }

    /// Scores every entry against the raw query, the enhanced query's
    /// matched terms/regulation hints, and the detected ship type.
    /// Returns entries with positive score, highest first, capped at
    /// `limit`.
    pub fn matches(
        &self,
        query: &str,
        enhanced: &EnhancedQuery,
        ship_type: Option<&str>,
        limit: usize,
    ) -> Vec<KnowledgeMatch> {
        let lower_query = query.to_lowercase();
        let matched_terms: Vec<String> =
            enhanced.matched_terms.iter().map(|t| t.term.to_lowercase()).collect();

        let mut scored: Vec<KnowledgeMatch> = self
            .entries
            .iter()
            .map(|entry| {
                let mut score = 0i32;

                for kw in &entry.keywords {
                    if lower_query.contains(&kw.to_lowercase())
                        || matched_terms.iter().any(|t| t == &kw.to_lowercase())
                    {
                        score += 2;
                    }
                }
                for term in &entry.english_terms {
                    if matched_terms.contains(&term.to_lowercase()) {
                        score += 2;
                    }
                }
                for reg in &entry.regulation_ids {
                    if enhanced.regulation_hints.contains(reg) {
                        score += 3;
                    }
                }
                if let Some(st) = ship_type {
                    if entry.ship_types.contains(st) {
                        score += 2;
                    }
                }

                KnowledgeMatch { entry: entry.clone(), score }
            })
            .filter(|m| m.score > 0)
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(limit);
        scored
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_core::{MatchedTerm, TermSource};
    use std::collections::HashSet;

    fn sample_entry() -> PracticalKnowledgeEntry {
        PracticalKnowledgeEntry {
            id: "k1".to_string(),
            title: "Liferaft count on cargo ships".to_string(),
            keywords: HashSet::from(["liferaft".to_string()]),
            english_terms: HashSet::from(["liferaft".to_string()]),
            regulation_ids: HashSet::from(["SOLAS III/31".to_string()]),
            ship_types: HashSet::from(["cargo ship".to_string()]),
            common_mistake: Some("Assuming one liferaft per side is always enough.".to_string()),
            correct_interpretation: Some("Each side must independently cover 100% of persons on board.".to_string()),
            typical_configurations: None,
            decision_tree: None,
        }
    }

    #[test]
    fn test_matches_on_regulation_hint() {
        let index = PracticalKnowledgeIndex { entries: vec![sample_entry()] };
        let enhanced = EnhancedQuery {
            enhanced_text: "liferaft each side".to_string(),
            matched_terms: vec![MatchedTerm { term: "liferaft".to_string(), source: TermSource::Expansion }],
            regulation_hints: vec!["SOLAS III/31".to_string()],
        };

        let matches = index.matches("liferaft requirements", &enhanced, Some("cargo ship"), 3);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].score >= 7);
    }

    #[test]
    fn test_no_match_returns_empty() {
        let index = PracticalKnowledgeIndex { entries: vec![sample_entry()] };
        let enhanced = EnhancedQuery {
            enhanced_text: "engine room ventilation".to_string(),
            matched_terms: vec![],
            regulation_hints: vec![],
        };
        assert!(index.matches("engine room ventilation", &enhanced, None, 3).is_empty());
    }
}
