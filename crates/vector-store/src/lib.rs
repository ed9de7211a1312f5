//! # DocQA Vector Store
//!
//! Embedding, exact nearest-neighbor search and durable per-namespace storage
//! for document chunks.
//!
//! ## Architecture
//!
//! ```text
//! Chunk[] (docqa-chunker)
//!     │
//!     ├──> EmbeddingProvider (stub | OpenAI-compatible HTTP)
//!     │      └─> Vec<f32>[dimension], retried with backoff
//!     │
//!     ├──> VectorIndex (texts + metadata + FlatIndex, positionally bound)
//!     │      └─> exact squared-L2 search, ties by position
//!     │
//!     └──> IndexStore
//!            └─> N.<generation>.index + N.meta.json (commit point), advisory lock
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docqa_vector_store::{EmbeddingProvider, IndexStore, StubEmbedder, VectorIndex};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = StubEmbedder::new(8);
//!     let texts = vec!["alpha beta".to_string()];
//!     let vectors = embedder.embed_batch(&texts).await?;
//!
//!     let meta = docqa_chunker::chunk("alpha beta", 500, 50, "a.txt")?.1;
//!     let index = VectorIndex::build("doc-1", 8, texts, meta, &vectors)?;
//!
//!     let store = IndexStore::new("vector_indexes");
//!     store.save(&index).await?;
//!     let loaded = store.load("doc-1").await?;
//!     assert_eq!(loaded.texts(), index.texts());
//!     Ok(())
//! }
//! ```

mod embeddings;
mod error;
mod flat_index;
mod http_embedder;
mod index;
mod index_lock;
mod paths;
mod retry;
mod store;

pub use embeddings::{
    build_provider, shared_provider, validate_embeddings, EmbeddingConfig, EmbeddingMode,
    EmbeddingProvider, StubEmbedder, DEFAULT_BASE_URL, DEFAULT_DIMENSION, DEFAULT_MODEL_ID,
    DEFAULT_TIMEOUT_MS,
};
pub use error::{Result, VectorStoreError};
pub use flat_index::{FlatIndex, Neighbor};
pub use http_embedder::HttpEmbedder;
pub use index::{VectorIndex, VectorRecord};
pub use paths::{validate_namespace, NamespacePaths, DEFAULT_INDEX_DIR_NAME};
pub use retry::{embed_with_retry, with_timeout, RetryPolicy};
pub use store::{IndexStore, INDEX_SCHEMA_VERSION};

// Re-export chunker types for convenience
pub use docqa_chunker::{Chunk, ChunkMetadata};
