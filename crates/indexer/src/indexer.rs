use crate::error::Result;
use crate::parser::{DocumentBody, DocumentParser, ParsedDocument, PlainTextParser};
use crate::stats::IndexStats;
use docqa_chunker::{Chunker, ChunkerConfig};
use docqa_vector_store::{
    embed_with_retry, validate_namespace, EmbeddingProvider, IndexStore, RetryPolicy, VectorIndex,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Ingestion pipeline: parse, chunk, embed every chunk, build, optionally save.
///
/// The index is only constructed once all chunks are embedded, and only
/// saved once it is fully built, so a failed ingestion never leaves a
/// partial namespace behind.
pub struct DocumentIndexer {
    provider: Arc<dyn EmbeddingProvider>,
    store: IndexStore,
    chunker: Chunker,
    parser: Arc<dyn DocumentParser>,
    retry: RetryPolicy,
}

impl DocumentIndexer {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: IndexStore,
        config: ChunkerConfig,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            store,
            chunker: Chunker::new(config)?,
            parser: Arc::new(PlainTextParser),
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &IndexStore {
        &self.store
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Index raw text under `namespace`
    pub async fn index_text(
        &self,
        namespace: &str,
        source_name: &str,
        text: &str,
        persist: bool,
    ) -> Result<(VectorIndex, IndexStats)> {
        let document = ParsedDocument::text(source_name, text);
        self.index_document(namespace, &document, persist).await
    }

    /// Parse `path` with the configured parser, then index it under `namespace`
    pub async fn index_file(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
        persist: bool,
    ) -> Result<(VectorIndex, IndexStats)> {
        validate_namespace(namespace)?;
        let document = self.parser.parse(path.as_ref()).await?;
        self.index_document(namespace, &document, persist).await
    }

    /// Index an already parsed document
    pub async fn index_document(
        &self,
        namespace: &str,
        document: &ParsedDocument,
        persist: bool,
    ) -> Result<(VectorIndex, IndexStats)> {
        let start = Instant::now();
        validate_namespace(namespace)?;

        let chunks = match &document.body {
            DocumentBody::Text(text) => self.chunker.chunk_str(text, &document.source_name),
            DocumentBody::Pages(pages) => self.chunker.chunk_pages(pages, &document.source_name),
        };
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        let vectors = embed_with_retry(self.provider.as_ref(), &texts, &self.retry).await?;
        let index = VectorIndex::from_chunks(namespace, self.provider.dimension(), chunks, &vectors)?
            .with_model_id(self.provider.model_id());

        if persist {
            self.store.save(&index).await?;
        }

        let stats = IndexStats {
            namespace: namespace.to_string(),
            source: document.source_name.clone(),
            chunks: index.len(),
            words: document.word_count(),
            pages: document.page_count(),
            dimension: index.dimension(),
            model_id: self.provider.model_id().to_string(),
            persisted: persist,
            time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        log::info!(
            "Indexed '{}' into namespace '{namespace}': {} chunks, {} words in {} ms",
            stats.source,
            stats.chunks,
            stats.words,
            stats.time_ms
        );
        Ok((index, stats))
    }
}
