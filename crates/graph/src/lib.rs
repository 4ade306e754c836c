//! Reference-graph client (C3): parent/child chains, cross-references,
//! interpretations, amendments and concept lookups over the regulation
//! corpus stored in Postgres. No teacher analogue — grounded on
//! `examples/other_examples/gaigenticai-RegulensAI`'s `sqlx`-over-Postgres
//! style for a regulatory-domain service.

pub mod error;

use async_trait::async_trait;
use bv_rag_core::{
    AuthorityLevel, Collection, CrossReference, PageType, ReferenceGraphClient, RegulationRecord,
    RelationKind, SourceType,
};
use sqlx::PgPool;

pub use error::GraphError;

/// Bounded recursion depth for `get_parent_chain`, mirroring
/// `bv_rag_config::constants::rag::PARENT_CHAIN_MAX_DEPTH`. Duplicated
/// here as a literal rather than pulled in as a dependency, since the
/// graph crate has no other reason to depend on `bv-rag-config`.
const PARENT_CHAIN_MAX_DEPTH: i32 = 20;

pub struct PgReferenceGraphClient {
    pool: PgPool,
}

impl PgReferenceGraphClient {
    pub async fn connect(database_url: &str) -> Result<Self, GraphError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Row count of the `regulations` table, for the admin stats endpoint.
    pub async fn count_regulations(&self) -> Result<i64, GraphError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM regulations").fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Single regulation by id, for `GET /api/v1/regulation/{doc_id}`.
    pub async fn get_regulation(&self, doc_id: &str) -> Result<Option<RegulationRecord>, GraphError> {
        let row: Option<RegulationRow> = sqlx::query_as(
            r#"SELECT id, source_url, title, breadcrumb, collection, document, chapter, part,
                      regulation, paragraph, body, page_type, parent_id, source_type, authority_level
               FROM regulations WHERE id = $1"#,
        )
        .bind(doc_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RegulationRecord::try_from).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct RegulationRow {
    id: String,
    source_url: String,
    title: String,
    breadcrumb: String,
    collection: String,
    document: String,
    chapter: Option<String>,
    part: Option<String>,
    regulation: Option<String>,
    paragraph: Option<String>,
    body: String,
    page_type: String,
    parent_id: Option<String>,
    source_type: String,
    authority_level: String,
}

impl TryFrom<RegulationRow> for RegulationRecord {
    type Error = GraphError;

    fn try_from(row: RegulationRow) -> Result<Self, GraphError> {
        Ok(RegulationRecord {
            id: row.id,
            source_url: row.source_url,
            title: row.title,
            breadcrumb: row.breadcrumb,
            collection: parse_collection(&row.collection)?,
            document: row.document,
            chapter: row.chapter,
            part: row.part,
            regulation: row.regulation,
            paragraph: row.paragraph,
            body: row.body,
            page_type: parse_page_type(&row.page_type)?,
            parent_id: row.parent_id,
            source_type: parse_source_type(&row.source_type)?,
            authority_level: parse_authority_level(&row.authority_level)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CrossReferenceRow {
    source_doc: String,
    target_doc: String,
    anchor_text: String,
    context: String,
    relation: String,
}

impl TryFrom<CrossReferenceRow> for CrossReference {
    type Error = GraphError;

    fn try_from(row: CrossReferenceRow) -> Result<Self, GraphError> {
        Ok(CrossReference {
            source_doc: row.source_doc,
            target_doc: row.target_doc,
            anchor_text: row.anchor_text,
            context: row.context,
            relation: parse_relation(&row.relation)?,
        })
    }
}

#[async_trait]
impl ReferenceGraphClient for PgReferenceGraphClient {
    async fn get_parent_chain(&self, doc_id: &str) -> bv_rag_core::Result<Vec<RegulationRecord>> {
        let rows: Vec<RegulationRow> = sqlx::query_as(
            r#"
            WITH RECURSIVE chain AS (
                SELECT r.*, 0 AS depth
                FROM regulations r
                WHERE r.id = $1
                UNION ALL
                SELECT p.*, c.depth + 1
                FROM regulations p
                JOIN chain c ON p.id = c.parent_id
                WHERE c.depth < $2
            )
            SELECT id, source_url, title, breadcrumb, collection, document, chapter, part,
                   regulation, paragraph, body, page_type, parent_id, source_type, authority_level
            FROM chain
            WHERE id != $1
            ORDER BY depth DESC
            "#,
        )
        .bind(doc_id)
        .bind(PARENT_CHAIN_MAX_DEPTH)
        .fetch_all(&self.pool)
        .await
        .map_err(GraphError::from)?;

        rows.into_iter().map(RegulationRecord::try_from).collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    async fn get_children(&self, doc_id: &str) -> bv_rag_core::Result<Vec<RegulationRecord>> {
        let rows: Vec<RegulationRow> = sqlx::query_as(
            r#"SELECT id, source_url, title, breadcrumb, collection, document, chapter, part,
                      regulation, paragraph, body, page_type, parent_id, source_type, authority_level
               FROM regulations WHERE parent_id = $1 ORDER BY id"#,
        )
        .bind(doc_id)
        .fetch_all(&self.pool)
        .await
        .map_err(GraphError::from)?;

        rows.into_iter().map(RegulationRecord::try_from).collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    async fn get_cross_references(&self, doc_id: &str) -> bv_rag_core::Result<Vec<CrossReference>> {
        self.references_where(doc_id, "relation = 'references'").await
    }

    async fn get_interpretations(&self, doc_id: &str) -> bv_rag_core::Result<Vec<CrossReference>> {
        self.references_where(doc_id, "relation = 'interprets'").await
    }

    async fn get_amendments(&self, doc_id: &str) -> bv_rag_core::Result<Vec<CrossReference>> {
        self.references_where(doc_id, "relation = 'amends'").await
    }

    async fn get_related_by_concept(&self, name: &str) -> bv_rag_core::Result<Vec<RegulationRecord>> {
        let rows: Vec<RegulationRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.source_url, r.title, r.breadcrumb, r.collection, r.document, r.chapter,
                   r.part, r.regulation, r.paragraph, r.body, r.page_type, r.parent_id,
                   r.source_type, r.authority_level
            FROM regulations r
            JOIN concept_regulations cr ON cr.regulation_id = r.id
            WHERE cr.concept_name = $1
            ORDER BY r.document, r.regulation
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(GraphError::from)?;

        rows.into_iter().map(RegulationRecord::try_from).collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl PgReferenceGraphClient {
    async fn references_where(
        &self,
        doc_id: &str,
        relation_predicate: &str,
    ) -> bv_rag_core::Result<Vec<CrossReference>> {
        let query = format!(
            "SELECT source_doc, target_doc, anchor_text, context, relation \
             FROM cross_references \
             WHERE (source_doc = $1 OR target_doc = $1) AND {relation_predicate} \
             ORDER BY source_doc, target_doc"
        );

        let rows: Vec<CrossReferenceRow> = sqlx::query_as(&query)
            .bind(doc_id)
            .fetch_all(&self.pool)
            .await
            .map_err(GraphError::from)?;

        rows.into_iter().map(CrossReference::try_from).collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn parse_collection(s: &str) -> Result<Collection, GraphError> {
    Ok(match s {
        "convention" => Collection::Convention,
        "code" => Collection::Code,
        "resolution" => Collection::Resolution,
        "circular" => Collection::Circular,
        "guideline" => Collection::Guideline,
        "specification" => Collection::Specification,
        "conference" => Collection::Conference,
        other => return Err(GraphError::MalformedRow(format!("unknown collection: {other}"))),
    })
}

fn parse_source_type(s: &str) -> Result<SourceType, GraphError> {
    Ok(match s {
        "imo_rules" => SourceType::ImoRules,
        "bv_rules" => SourceType::BvRules,
        "iacs_ur" => SourceType::IacsUr,
        "iacs_ui" => SourceType::IacsUi,
        "other" => SourceType::Other,
        other => return Err(GraphError::MalformedRow(format!("unknown source_type: {other}"))),
    })
}

fn parse_authority_level(s: &str) -> Result<AuthorityLevel, GraphError> {
    Ok(match s {
        "convention" => AuthorityLevel::Convention,
        "resolution" => AuthorityLevel::Resolution,
        "iacs_ur" => AuthorityLevel::IacsUr,
        "iacs_ui" => AuthorityLevel::IacsUi,
        "classification_rule" => AuthorityLevel::ClassificationRule,
        "guidance_note" => AuthorityLevel::GuidanceNote,
        other => return Err(GraphError::MalformedRow(format!("unknown authority_level: {other}"))),
    })
}

fn parse_page_type(s: &str) -> Result<PageType, GraphError> {
    Ok(match s {
        "index" => PageType::Index,
        "content" => PageType::Content,
        "footnote" => PageType::Footnote,
        "collection" => PageType::Collection,
        other => return Err(GraphError::MalformedRow(format!("unknown page_type: {other}"))),
    })
}

fn parse_relation(s: &str) -> Result<RelationKind, GraphError> {
    Ok(match s {
        "references" => RelationKind::References,
        "interprets" => RelationKind::Interprets,
        "amends" => RelationKind::Amends,
        other => return Err(GraphError::MalformedRow(format!("unknown relation: {other}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_roundtrip() {
        assert_eq!(parse_collection("convention").unwrap(), Collection::Convention);
        assert!(parse_collection("nonsense").is_err());
    }

    #[test]
    fn test_parse_relation() {
        assert_eq!(parse_relation("interprets").unwrap(), RelationKind::Interprets);
    }
}
