use serde::{Deserialize, Serialize};

/// Outcome of one ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Namespace the index was built under
    pub namespace: String,

    /// Source name carried into every chunk's metadata
    pub source: String,

    /// Number of chunks created
    pub chunks: usize,

    /// Whitespace-delimited words in the document
    pub words: usize,

    /// Pages seen by the parser (1 for unpaged text)
    pub pages: usize,

    /// Embedding width of the built index
    pub dimension: usize,

    pub model_id: String,

    /// Whether the index was written to the store
    pub persisted: bool,

    /// Time taken in milliseconds
    pub time_ms: u64,
}
