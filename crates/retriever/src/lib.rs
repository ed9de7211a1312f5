//! # DocQA Retriever
//!
//! Query-time half of the engine: embed a question, search one namespace,
//! map hits back to chunk text and provenance.
//!
//! Results are never deduplicated here; [`citations`] builds a distinct
//! source list for callers that want one, and [`join_context`] assembles
//! ranked chunk text for an external answer generator.

mod error;
mod retriever;
mod scored;

pub use error::{Result, SearchError};
pub use retriever::{search_vector, Retriever};
pub use scored::{citations, join_context, Citation, ScoredChunk};
