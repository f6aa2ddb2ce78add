//! Pipeline facade: the two operations the outside world calls.
//!
//! A [`Pipeline`] is an explicitly constructed service instance — config
//! plus injected store, embedder, and generator — passed to the CLI and
//! HTTP layers at startup. There is no process-global state; two
//! pipelines over different stores are fully independent, and concurrent
//! queries against one are read-only.

use std::path::Path;
use std::sync::Arc;

use crate::answer::compose_answer;
use crate::chunk::chunk_pages;
use crate::config::Config;
use crate::db;
use crate::embedding::{create_embedder, Embedder};
use crate::error::PipelineError;
use crate::generate::{create_generator, Generator};
use crate::index::{self, make_index_key, DocumentIndex};
use crate::migrate;
use crate::models::{Answer, DocumentPage};
use crate::pdf;
use crate::retrieve::retrieve;
use crate::store::{IndexStore, SqliteStore};

/// Result of indexing one document.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    /// Store key the index was persisted under.
    pub index_key: String,
    pub chunk_count: usize,
}

pub struct Pipeline {
    config: Config,
    store: Arc<dyn IndexStore>,
    embedder: Option<Arc<dyn Embedder>>,
    generator: Arc<dyn Generator>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        store: Arc<dyn IndexStore>,
        embedder: Option<Arc<dyn Embedder>>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
            generator,
        }
    }

    /// Construct with the SQLite store and the providers named in config.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let pool = db::connect(&config).await?;
        migrate::run_on(&pool).await?;
        let store = Arc::new(SqliteStore::new(pool));
        let embedder = create_embedder(&config.embedding)?;
        let generator = create_generator(&config.generation)?;
        Ok(Self::new(config, store, embedder, generator))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract, chunk, index, and persist one PDF. Returns the index key.
    pub async fn process_document(&self, path: &Path) -> Result<ProcessedDocument, PipelineError> {
        tracing::info!(path = %path.display(), "loading PDF");
        let pages = pdf::read_pdf_pages(path)?;
        self.process_pages(&path.to_string_lossy(), pages).await
    }

    /// Index already-extracted pages under the given document identifier.
    ///
    /// This is the seam for callers that bring their own ingestion: an
    /// ordered sequence of (page text, page number) in, an index key out.
    pub async fn process_pages(
        &self,
        document: &str,
        pages: Vec<DocumentPage>,
    ) -> Result<ProcessedDocument, PipelineError> {
        let chunks = chunk_pages(
            &pages,
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
        )?;
        tracing::info!(document, chunks = chunks.len(), "split document into chunks");

        let strategy = self.config.scoring.strategy;
        let index = index::build(
            chunks,
            strategy,
            self.config.scoring.max_features,
            self.embedder.as_deref(),
        )
        .await?;

        let key = make_index_key(document, strategy);
        let blob = index.to_bytes()?;
        self.store.put(&key, &blob).await?;
        tracing::info!(key = %key, "saved index");

        Ok(ProcessedDocument {
            index_key: key,
            chunk_count: index.chunks.len(),
        })
    }

    /// Load and decode the index stored at `key`.
    pub async fn load_index(&self, key: &str) -> Result<DocumentIndex, PipelineError> {
        let blob = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| PipelineError::IndexNotFound(key.to_string()))?;
        DocumentIndex::from_bytes(&blob)
    }

    /// Accept either a raw index key or a document path; a path resolves
    /// to its key under the configured strategy.
    pub async fn resolve_index_key(&self, document: &str) -> Result<String, PipelineError> {
        if self.store.get(document).await?.is_some() {
            return Ok(document.to_string());
        }
        Ok(make_index_key(document, self.config.scoring.strategy))
    }

    /// Retrieve the top-k chunks for `question` and compose a cited
    /// answer.
    pub async fn answer_query(
        &self,
        index_key: &str,
        question: &str,
    ) -> Result<Answer, PipelineError> {
        tracing::info!(index_key, "querying index");
        let index = self.load_index(index_key).await?;
        let retrieved = retrieve(
            &index,
            question,
            self.config.retrieval.top_k,
            self.embedder.as_deref(),
        )
        .await?;
        tracing::debug!(retrieved = retrieved.len(), "retrieved chunks");
        compose_answer(self.generator.as_ref(), question, &retrieved).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct CannedGenerator;

    #[async_trait]
    impl Generator for CannedGenerator {
        fn model_name(&self) -> &str {
            "canned"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
            Ok("According to the context, dogs are loyal [Source 1].".to_string())
        }
    }

    fn test_pipeline() -> Pipeline {
        Pipeline::new(
            Config::default(),
            Arc::new(MemoryStore::new()),
            None,
            Arc::new(CannedGenerator),
        )
    }

    fn pages(texts: &[&str]) -> Vec<DocumentPage> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentPage {
                text: t.to_string(),
                number: i as u32 + 1,
            })
            .collect()
    }

    #[tokio::test]
    async fn process_then_answer_round_trip() {
        let pipeline = test_pipeline();
        let processed = pipeline
            .process_pages(
                "pets.pdf",
                pages(&["Cats are mammals.", "Dogs are loyal."]),
            )
            .await
            .unwrap();
        assert_eq!(processed.index_key, "pets.pdf_tfidf");
        assert_eq!(processed.chunk_count, 2);

        let answer = pipeline
            .answer_query(&processed.index_key, "Are dogs loyal?")
            .await
            .unwrap();
        assert!(answer.answer.contains("[Source 1]"));
        assert_eq!(answer.sources.len(), 2);
    }

    #[tokio::test]
    async fn missing_index_is_not_found() {
        let pipeline = test_pipeline();
        let err = pipeline
            .answer_query("missing.pdf_tfidf", "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn resolve_prefers_exact_key_then_derives() {
        let pipeline = test_pipeline();
        pipeline
            .process_pages("doc.pdf", pages(&["Some page text here."]))
            .await
            .unwrap();

        // Exact key hits.
        assert_eq!(
            pipeline.resolve_index_key("doc.pdf_tfidf").await.unwrap(),
            "doc.pdf_tfidf"
        );
        // A path derives the key under the configured strategy.
        assert_eq!(
            pipeline.resolve_index_key("doc.pdf").await.unwrap(),
            "doc.pdf_tfidf"
        );
    }

    #[tokio::test]
    async fn rebuild_replaces_the_index_atomically_for_readers() {
        let pipeline = test_pipeline();
        pipeline
            .process_pages("doc.pdf", pages(&["Old content about ships."]))
            .await
            .unwrap();
        pipeline
            .process_pages("doc.pdf", pages(&["New content about trains."]))
            .await
            .unwrap();

        let index = pipeline.load_index("doc.pdf_tfidf").await.unwrap();
        assert_eq!(index.chunks.len(), 1);
        assert!(index.chunks[0].text.contains("trains"));
    }
}
