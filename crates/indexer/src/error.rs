use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] docqa_chunker::ChunkerError),

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] docqa_vector_store::VectorStoreError),

    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl IndexerError {
    /// The underlying vector store error, if this wraps one
    #[must_use]
    pub const fn as_vector_store(&self) -> Option<&docqa_vector_store::VectorStoreError> {
        match self {
            Self::VectorStoreError(err) => Some(err),
            _ => None,
        }
    }
}
