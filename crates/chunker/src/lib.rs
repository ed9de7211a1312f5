//! # DocQA Chunker
//!
//! Deterministic word-window chunking for document retrieval.
//!
//! A document is split on whitespace into a word sequence and cut into windows
//! of `chunk_size` words, each window starting `chunk_size - overlap` words
//! after the previous one. The last window is truncated at the end of the
//! document.
//!
//! ```text
//! words:   0 ............................................. 1200
//! chunk 0: [0, 500)
//! chunk 1:           [450, 950)
//! chunk 2:                      [900, 1200)
//! ```
//!
//! Guarantees:
//! - chunk indexes run `0, 1, 2, …` without gaps
//! - the union of all word ranges is `[0, total_words)`
//! - identical input always yields identical chunks and metadata
//!
//! ## Example
//!
//! ```rust
//! use docqa_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::new(4, 1)).unwrap();
//! let chunks = chunker.chunk_str("the quick brown fox jumps over the lazy dog", "fox.txt");
//!
//! for chunk in &chunks {
//!     println!("#{} words {:?}: {}", chunk.chunk_index, chunk.word_range, chunk.content);
//! }
//! assert_eq!(chunks.len(), 3);
//! ```

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::{chunk, Chunker};
pub use config::{ChunkerConfig, OverlapPolicy, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use error::{ChunkerError, Result};
pub use types::{Chunk, ChunkMetadata, PageText};
