//! Utility Store & Reranker (C6)
//!
//! Tracks a per-`(chunk_id, category)` exponential moving average of how
//! useful a chunk has turned out to be in past answers, persisted in
//! Postgres and cached in memory with `dashmap` so the hot read path
//! (blend into fusion score) never waits on the database.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bv_rag_config::constants::rag as rag_constants;
use bv_rag_config::domain::SharedDomainTables;
use bv_rag_core::ChunkUtility;
use dashmap::DashMap;
use sqlx::PgPool;

use crate::error::RagError;

/// Fixed keyword router assigning a query to one of the closed
/// `QueryCategory` buckets. First matching category wins; unmatched
/// queries fall into `General`.
pub fn categorize_query(query: &str) -> bv_rag_core::QueryCategory {
    use bv_rag_core::QueryCategory::*;

    let lower = query.to_lowercase();
    let buckets: &[(QueryCategory, &[&str])] = &[
        (FireSafety, &["fire", "防火", "消防"]),
        (Lifesaving, &["liferaft", "lifeboat", "救生", "lifesaving"]),
        (Pollution, &["pollution", "marpol", "ballast", "discharge", "污染"]),
        (Stability, &["stability", "稳性"]),
        (Structure, &["bulkhead", "structure", "舱壁", "结构"]),
        (Machinery, &["engine", "machinery", "机舱", "机器"]),
        (Navigation, &["navigation", "colreg", "航行"]),
        (Survey, &["survey", "检验"]),
    ];

    buckets
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(cat, _)| *cat)
        .unwrap_or(General)
}

pub struct UtilityStore {
    pool: PgPool,
    cache: DashMap<(String, bv_rag_core::QueryCategory), ChunkUtility>,
    tables: SharedDomainTables,
}

/// One row of the admin utility-stats aggregate, grouped by query category.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryUtilityStats {
    pub category: String,
    pub count: i64,
    pub mean_utility: f32,
    pub mean_use_count: f32,
    pub count_above_high: i64,
    pub count_below_low: i64,
}

impl UtilityStore {
    pub async fn connect(database_url: &str, tables: SharedDomainTables) -> Result<Self, RagError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| RagError::UtilityStore(e.to_string()))?;

        Ok(Self { pool, cache: DashMap::new(), tables })
    }

    /// Current utility for a chunk in a category, defaulting to 0.5 for
    /// chunks never scored before. Cache-first; only misses hit Postgres.
    pub async fn get(
        &self,
        chunk_id: &str,
        category: bv_rag_core::QueryCategory,
    ) -> Result<ChunkUtility, RagError> {
        let key = (chunk_id.to_string(), category);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(*cached);
        }

        let row = sqlx::query_as::<_, (f32, i32, i32, i64)>(
            "SELECT utility, use_count, success_count, last_used_unix_ms \
             FROM chunk_utility WHERE chunk_id = $1 AND category = $2",
        )
        .bind(chunk_id)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RagError::UtilityStore(e.to_string()))?;

        let utility = match row {
            Some((utility, use_count, success_count, last_used_unix_ms)) => ChunkUtility {
                utility,
                use_count: use_count as u32,
                success_count: success_count as u32,
                last_used_unix_ms,
            },
            None => ChunkUtility::default(),
        };

        self.cache.insert(key, utility);
        Ok(utility)
    }

    /// Applies the EMA update `u <- 0.9*u + 0.1*reward` for a chunk that
    /// was retrieved, clamps to `[0, 1]`, and persists the row.
    pub async fn record_outcome(
        &self,
        chunk_id: &str,
        category: bv_rag_core::QueryCategory,
        was_cited: bool,
        confidence: &str,
        is_refusal: bool,
    ) -> Result<ChunkUtility, RagError> {
        let mut current = self.get(chunk_id, category).await?;

        let reward = {
            let tables = self.tables.read();
            tables.reward_table.reward(was_cited, confidence, is_refusal)
        };

        current.utility = (0.9 * current.utility + 0.1 * reward).clamp(0.0, 1.0);
        current.use_count += 1;
        if was_cited {
            current.success_count += 1;
        }
        current.last_used_unix_ms = now_unix_ms();

        sqlx::query(
            "INSERT INTO chunk_utility (chunk_id, category, utility, use_count, success_count, last_used_unix_ms) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (chunk_id, category) DO UPDATE SET \
               utility = EXCLUDED.utility, \
               use_count = EXCLUDED.use_count, \
               success_count = EXCLUDED.success_count, \
               last_used_unix_ms = EXCLUDED.last_used_unix_ms",
        )
        .bind(chunk_id)
        .bind(category.as_str())
        .bind(current.utility)
        .bind(current.use_count as i32)
        .bind(current.success_count as i32)
        .bind(current.last_used_unix_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| RagError::UtilityStore(e.to_string()))?;

        self.cache.insert((chunk_id.to_string(), category), current);
        Ok(current)
    }

    /// Per-category utility aggregates for the admin utility-stats endpoint.
    pub async fn category_stats(&self) -> Result<Vec<CategoryUtilityStats>, RagError> {
        let rows = sqlx::query_as::<_, (String, i64, f32, f32, i64, i64)>(
            "SELECT category, \
                    COUNT(*) AS count, \
                    AVG(utility) AS mean_utility, \
                    AVG(use_count) AS mean_use_count, \
                    COUNT(*) FILTER (WHERE utility > 0.7) AS above_high, \
                    COUNT(*) FILTER (WHERE utility < 0.3) AS below_low \
             FROM chunk_utility \
             GROUP BY category \
             ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RagError::UtilityStore(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(category, count, mean_utility, mean_use_count, above_high, below_low)| {
                CategoryUtilityStats {
                    category,
                    count,
                    mean_utility,
                    mean_use_count,
                    count_above_high: above_high,
                    count_below_low: below_low,
                }
            })
            .collect())
    }

    /// Blends a fusion score with a chunk's learned utility. The weight
    /// given to utility grows with how often the chunk has actually been
    /// used, capped at `UTILITY_ALPHA_MAX`, so freshly-indexed chunks
    /// aren't penalised by an uninformative prior.
    pub fn blend(&self, fused_score: f32, utility: ChunkUtility) -> f32 {
        let alpha = (rag_constants::UTILITY_ALPHA + 0.01 * utility.use_count as f32)
            .min(rag_constants::UTILITY_ALPHA_MAX);
        fused_score * (1.0 - alpha) + utility.utility * alpha
    }
}

fn now_unix_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

/// In-memory-only utility store for tests and for deployments that opt
/// out of persistence (`PersistenceSettings::utility_store_enabled = false`).
pub struct InMemoryUtilityStore {
    cache: DashMap<(String, bv_rag_core::QueryCategory), ChunkUtility>,
    tables: SharedDomainTables,
}

impl InMemoryUtilityStore {
    pub fn new(tables: SharedDomainTables) -> Self {
        Self { cache: DashMap::new(), tables }
    }

    pub fn get(&self, chunk_id: &str, category: bv_rag_core::QueryCategory) -> ChunkUtility {
        self.cache.get(&(chunk_id.to_string(), category)).map(|v| *v).unwrap_or_default()
    }

    pub fn record_outcome(
        &self,
        chunk_id: &str,
        category: bv_rag_core::QueryCategory,
        was_cited: bool,
        confidence: &str,
        is_refusal: bool,
    ) -> ChunkUtility {
        let mut current = self.get(chunk_id, category);
        let reward = {
            let tables = self.tables.read();
            tables.reward_table.reward(was_cited, confidence, is_refusal)
        };
        current.utility = (0.9 * current.utility + 0.1 * reward).clamp(0.0, 1.0);
        current.use_count += 1;
        if was_cited {
            current.success_count += 1;
        }
        current.last_used_unix_ms = now_unix_ms();
        self.cache.insert((chunk_id.to_string(), category), current);
        current
    }
}

pub type SharedInMemoryUtilityStore = Arc<InMemoryUtilityStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_config::domain::{shared, DomainTables};
    use bv_rag_core::QueryCategory;

    #[test]
    fn test_categorize_query() {
        assert_eq!(categorize_query("liferaft requirements"), QueryCategory::Lifesaving);
        assert_eq!(categorize_query("hello"), QueryCategory::General);
    }

    #[test]
    fn test_ema_update_in_memory() {
        let store = InMemoryUtilityStore::new(shared(DomainTables::built_in()));
        let u0 = store.get("c1", QueryCategory::FireSafety);
        assert_eq!(u0.utility, 0.5);

        let u1 = store.record_outcome("c1", QueryCategory::FireSafety, true, "high", false);
        assert!(u1.utility > u0.utility);
        assert_eq!(u1.use_count, 1);
        assert_eq!(u1.success_count, 1);
    }

    #[test]
    fn test_refusal_penalty() {
        let store = InMemoryUtilityStore::new(shared(DomainTables::built_in()));
        let u1 = store.record_outcome("c2", QueryCategory::General, false, "low", true);
        assert!(u1.utility < 0.5);
    }
}
