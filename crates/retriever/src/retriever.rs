use crate::error::{Result, SearchError};
use crate::scored::ScoredChunk;
use docqa_vector_store::{
    embed_with_retry, EmbeddingProvider, IndexStore, RetryPolicy, VectorIndex, VectorStoreError,
};
use std::sync::Arc;

/// Top-k retrieval over one namespace at a time
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: IndexStore,
    retry: RetryPolicy,
}

impl Retriever {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: IndexStore) -> Self {
        Self {
            provider,
            store,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Load `namespace`, warning when it was built by a different model
    pub async fn load_index(&self, namespace: &str) -> Result<VectorIndex> {
        let index = self.store.load(namespace).await?;
        self.check_model(&index);
        Ok(index)
    }

    /// Load `namespace`, embed `query` and return its `k` nearest chunks
    pub async fn retrieve(&self, query: &str, namespace: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        ensure_query(query)?;
        let index = self.load_index(namespace).await?;
        self.retrieve_in(&index, query, k).await
    }

    /// Retrieve from an index the caller already holds
    pub async fn retrieve_in(
        &self,
        index: &VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        ensure_query(query)?;
        let mut vectors =
            embed_with_retry(self.provider.as_ref(), &[query.to_string()], &self.retry).await?;
        let vector = vectors.pop().ok_or_else(|| {
            VectorStoreError::EmbeddingError("Empty embedding result".to_string())
        })?;
        search_vector(index, &vector, k)
    }

    /// Several questions against one namespace.
    ///
    /// The index is loaded once and all queries go to the provider in a
    /// single batch. Results are in query order.
    pub async fn retrieve_many(
        &self,
        queries: &[String],
        namespace: &str,
        k: usize,
    ) -> Result<Vec<Vec<ScoredChunk>>> {
        for query in queries {
            ensure_query(query)?;
        }
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.load_index(namespace).await?;
        let vectors = embed_with_retry(self.provider.as_ref(), queries, &self.retry).await?;
        vectors
            .iter()
            .map(|vector| search_vector(&index, vector, k))
            .collect()
    }

    fn check_model(&self, index: &VectorIndex) {
        if let Some(recorded) = index.model_id() {
            if recorded != self.provider.model_id() {
                log::warn!(
                    "Namespace '{}' was built with model '{recorded}', querying with '{}'",
                    index.namespace(),
                    self.provider.model_id()
                );
            }
        }
    }
}

/// Search `index` with a precomputed query embedding.
///
/// A vector whose width differs from the index's recorded dimension is a
/// `DimensionMismatch`; it is never truncated or padded.
pub fn search_vector(index: &VectorIndex, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
    if query.len() != index.dimension() {
        return Err(VectorStoreError::DimensionMismatch {
            expected: index.dimension(),
            actual: query.len(),
        }
        .into());
    }

    let neighbors = index.search(query, k)?;
    let mut results = Vec::with_capacity(neighbors.len());
    for neighbor in neighbors {
        let record = index.record(neighbor.position).ok_or(VectorStoreError::Misaligned {
            texts: index.texts().len(),
            metadata: index.metadata().len(),
            vectors: neighbor.position + 1,
        })?;
        results.push(ScoredChunk {
            content: record.text.to_string(),
            metadata: record.metadata.clone(),
            distance: neighbor.distance,
        });
    }
    log::debug!(
        "Namespace '{}': {} of {} chunks returned for k={k}",
        index.namespace(),
        results.len(),
        index.len()
    );
    Ok(results)
}

fn ensure_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        Err(SearchError::EmptyQuery)
    } else {
        Ok(())
    }
}
