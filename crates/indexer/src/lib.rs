//! # DocQA Indexer
//!
//! Document ingestion for namespace-scoped retrieval.
//!
//! ## Pipeline
//!
//! ```text
//! File / text
//!     │
//!     ├──> DocumentParser (plain text, form-feed pages)
//!     │      └─> ParsedDocument
//!     │
//!     ├──> Chunker (overlapping word windows)
//!     │      └─> Chunks + metadata
//!     │
//!     ├──> EmbeddingProvider (all chunks, retried)
//!     │      └─> VectorIndex
//!     │
//!     └──> IndexStore (optional)
//!            └─> N.<generation>.index + N.meta.json
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docqa_chunker::ChunkerConfig;
//! use docqa_indexer::DocumentIndexer;
//! use docqa_vector_store::{IndexStore, StubEmbedder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let indexer = DocumentIndexer::new(
//!         Arc::new(StubEmbedder::new(768)),
//!         IndexStore::new("vector_indexes"),
//!         ChunkerConfig::default(),
//!     )?;
//!     let (_index, stats) = indexer.index_file("policy", "policy.txt", true).await?;
//!
//!     println!("Indexed {} words into {} chunks", stats.words, stats.chunks);
//!     Ok(())
//! }
//! ```

mod error;
mod indexer;
mod parser;
mod stats;

pub use error::{IndexerError, Result};
pub use indexer::DocumentIndexer;
pub use parser::{DocumentBody, DocumentParser, ParsedDocument, PlainTextParser, FORM_FEED};
pub use stats::IndexStats;
