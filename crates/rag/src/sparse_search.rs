//! Lexical Search using Tantivy (BM25) (C2)
//!
//! Full-text ranked search over title/regulation/breadcrumb/body fields,
//! plus an exact-match lookup for queries that name a regulation number
//! directly (e.g. "SOLAS III/31").

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use bv_rag_core::{BackendHit, LexicalIndexClient, RetrievalFilters};
use parking_lot::RwLock;
use tantivy::{
    collector::TopDocs,
    query::QueryParser,
    schema::{Field, OwnedValue, Schema, TextFieldIndexing, TextOptions, STORED, STRING},
    tokenizer::{Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer},
    Index, IndexReader, IndexWriter, TantivyDocument,
};

use crate::error::RagError;

/// A chunk ready for indexing into the lexical store.
#[derive(Debug, Clone)]
pub struct IndexableChunk {
    pub chunk_id: String,
    pub regulation: String,
    pub breadcrumb: String,
    pub title: String,
    pub body: String,
    pub document: String,
    pub collection: String,
    pub source_type: String,
    pub chunk_type: String,
}

#[derive(Debug, Clone)]
pub struct SparseConfig {
    pub index_path: Option<String>,
    pub top_k: usize,
    pub stemming: bool,
}

impl Default for SparseConfig {
    fn default() -> Self {
        Self { index_path: None, top_k: 20, stemming: true }
    }
}

/// Tantivy-backed implementation of `LexicalIndexClient`. Bilingual
/// content is tokenized with `SimpleTokenizer`, which splits on Unicode
/// word boundaries and handles CJK text without requiring a dedicated
/// Chinese segmenter.
pub struct TantivyLexicalIndex {
    index: Index,
    reader: IndexReader,
    writer: RwLock<Option<IndexWriter>>,
    id_field: Field,
    regulation_field: Field,
    breadcrumb_field: Field,
    title_field: Field,
    body_field: Field,
    document_field: Field,
    collection_field: Field,
    source_type_field: Field,
    chunk_type_field: Field,
    config: SparseConfig,
}

impl TantivyLexicalIndex {
    pub fn new(config: SparseConfig) -> Result<Self, RagError> {
        let mut schema_builder = Schema::builder();

        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("bilingual")
                    .set_index_option(tantivy::schema::IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let id_field = schema_builder.add_text_field("chunk_id", STRING | STORED);
        let regulation_field = schema_builder.add_text_field("regulation", text_options.clone());
        let breadcrumb_field = schema_builder.add_text_field("breadcrumb", text_options.clone());
        let title_field = schema_builder.add_text_field("title", text_options.clone());
        let body_field = schema_builder.add_text_field("body", text_options);
        let document_field = schema_builder.add_text_field("document", STRING | STORED);
        let collection_field = schema_builder.add_text_field("collection", STRING | STORED);
        let source_type_field = schema_builder.add_text_field("source_type", STRING | STORED);
        let chunk_type_field = schema_builder.add_text_field("chunk_type", STRING | STORED);

        let schema = schema_builder.build();

        let index = if let Some(ref path) = config.index_path {
            let dir = tantivy::directory::MmapDirectory::open(Path::new(path))
                .map_err(|e| Self::index_err(e))?;
            Index::open_or_create(dir, schema.clone()).map_err(|e| Self::index_err(e))?
        } else {
            Index::create_in_ram(schema.clone())
        };

        let tokenizer = Self::build_tokenizer(&config);
        index.tokenizers().register("bilingual", tokenizer);

        let reader = index.reader().map_err(|e| Self::index_err(e))?;
        let writer = index.writer(50_000_000).map_err(|e| Self::index_err(e))?;

        Ok(Self {
            index,
            reader,
            writer: RwLock::new(Some(writer)),
            id_field,
            regulation_field,
            breadcrumb_field,
            title_field,
            body_field,
            document_field,
            collection_field,
            source_type_field,
            chunk_type_field,
            config,
        })
    }

    fn build_tokenizer(config: &SparseConfig) -> TextAnalyzer {
        let base = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(100))
            .filter(LowerCaser);

        if config.stemming {
            base.filter(Stemmer::new(Language::English)).build()
        } else {
            base.build()
        }
    }

    pub fn index_chunks(&self, chunks: &[IndexableChunk]) -> Result<(), RagError> {
        let mut writer = self.writer.write();
        let writer = writer.as_mut().ok_or_else(|| Self::index_err("writer not available"))?;

        for chunk in chunks {
            let mut doc = TantivyDocument::default();
            doc.add_text(self.id_field, &chunk.chunk_id);
            doc.add_text(self.regulation_field, &chunk.regulation);
            doc.add_text(self.breadcrumb_field, &chunk.breadcrumb);
            doc.add_text(self.title_field, &chunk.title);
            doc.add_text(self.body_field, &chunk.body);
            doc.add_text(self.document_field, &chunk.document);
            doc.add_text(self.collection_field, &chunk.collection);
            doc.add_text(self.source_type_field, &chunk.source_type);
            doc.add_text(self.chunk_type_field, &chunk.chunk_type);

            writer.add_document(doc).map_err(|e| Self::index_err(e))?;
        }

        writer.commit().map_err(|e| Self::index_err(e))?;
        self.reader.reload().map_err(|e| Self::index_err(e))?;

        Ok(())
    }

    pub fn delete(&self, chunk_ids: &[String]) -> Result<(), RagError> {
        let mut writer = self.writer.write();
        let writer = writer.as_mut().ok_or_else(|| Self::index_err("writer not available"))?;

        for id in chunk_ids {
            let term = tantivy::Term::from_field_text(self.id_field, id);
            writer.delete_term(term);
        }

        writer.commit().map_err(|e| Self::index_err(e))?;
        self.reader.reload().map_err(|e| Self::index_err(e))?;

        Ok(())
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn search_fields(
        &self,
        query: &str,
        fields: Vec<Field>,
        top_k: usize,
    ) -> Result<Vec<BackendHit>, RagError> {
        let searcher = self.reader.searcher();
        let query_parser = QueryParser::for_index(&self.index, fields);

        let parsed = query_parser.parse_query(query).map_err(|e| RagError::LexicalIndex {
            backend: "tantivy".to_string(),
            message: e.to_string(),
        })?;

        let top_docs =
            searcher.search(&parsed, &TopDocs::with_limit(top_k)).map_err(|e| Self::search_err(e))?;

        let mut hits = Vec::with_capacity(top_docs.len());

        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address).map_err(|e| Self::search_err(e))?;
            hits.push(self.doc_to_hit(&doc, score));
        }

        Ok(hits)
    }

    fn doc_to_hit(&self, doc: &TantivyDocument, score: f32) -> BackendHit {
        let str_field = |f: Field| -> String {
            doc.get_first(f)
                .and_then(|v| match v {
                    OwnedValue::Str(s) => Some(s.clone()),
                    _ => None,
                })
                .unwrap_or_default()
        };

        let chunk_id = str_field(self.id_field);
        let body = str_field(self.body_field);

        let mut metadata = HashMap::new();
        metadata.insert("title".to_string(), str_field(self.title_field));
        metadata.insert("breadcrumb".to_string(), str_field(self.breadcrumb_field));
        metadata.insert("regulation".to_string(), str_field(self.regulation_field));
        metadata.insert("document".to_string(), str_field(self.document_field));
        metadata.insert("collection".to_string(), str_field(self.collection_field));
        metadata.insert("source_type".to_string(), str_field(self.source_type_field));
        metadata.insert("chunk_type".to_string(), str_field(self.chunk_type_field));

        BackendHit { chunk_id, text: body, score, metadata }
    }

    fn index_err(e: impl std::fmt::Display) -> RagError {
        RagError::LexicalIndex { backend: "tantivy".to_string(), message: e.to_string() }
    }

    fn search_err(e: impl std::fmt::Display) -> RagError {
        RagError::LexicalIndex { backend: "tantivy".to_string(), message: e.to_string() }
    }
}

#[async_trait]
impl LexicalIndexClient for TantivyLexicalIndex {
    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &RetrievalFilters,
    ) -> bv_rag_core::Result<Vec<BackendHit>> {
        // Equality filters aren't pushed into the Tantivy query today; callers
        // needing them post-filter on `BackendHit::metadata`. Tracked as a gap
        // against wide full-text scans on very large corpora.
        let _ = filters;
        let k = top_k.max(1);

        let hits = self.search_fields(
            query_text,
            vec![self.title_field, self.breadcrumb_field, self.regulation_field, self.body_field],
            k,
        )?;

        Ok(hits)
    }

    async fn search_by_regulation_number(
        &self,
        reference: &str,
    ) -> bv_rag_core::Result<Vec<BackendHit>> {
        let hits = self.search_fields(
            reference,
            vec![self.regulation_field, self.breadcrumb_field],
            self.config.top_k,
        )?;

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunks() -> Vec<IndexableChunk> {
        vec![
            IndexableChunk {
                chunk_id: "c1".to_string(),
                regulation: "SOLAS III/31".to_string(),
                breadcrumb: "SOLAS > Chapter III > Regulation 31".to_string(),
                title: "Life-saving appliances and arrangements".to_string(),
                body: "Every cargo ship shall carry liferafts on each side sufficient to accommodate the total number of persons on board.".to_string(),
                document: "SOLAS".to_string(),
                collection: "convention".to_string(),
                source_type: "imo_rules".to_string(),
                chunk_type: "regulation".to_string(),
            },
            IndexableChunk {
                chunk_id: "c2".to_string(),
                regulation: "SOLAS II-2/9".to_string(),
                breadcrumb: "SOLAS > Chapter II-2 > Regulation 9".to_string(),
                title: "Containment of fire".to_string(),
                body: "Structural fire protection of bulkheads and decks.".to_string(),
                document: "SOLAS".to_string(),
                collection: "convention".to_string(),
                source_type: "imo_rules".to_string(),
                chunk_type: "regulation".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_search_matches_body_text() {
        let index = TantivyLexicalIndex::new(SparseConfig::default()).unwrap();
        index.index_chunks(&sample_chunks()).unwrap();

        let hits = index.search("liferafts", 10, &RetrievalFilters::default()).await.unwrap();
        assert_eq!(hits[0].chunk_id, "c1");
    }

    #[tokio::test]
    async fn test_search_by_regulation_number() {
        let index = TantivyLexicalIndex::new(SparseConfig::default()).unwrap();
        index.index_chunks(&sample_chunks()).unwrap();

        let hits = index.search_by_regulation_number("SOLAS III/31").await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].chunk_id, "c1");
    }
}
