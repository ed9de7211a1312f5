use docqa_vector_store::VectorStoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("Empty query")]
    EmptyQuery,
}

impl SearchError {
    /// The underlying vector store error, if this wraps one
    #[must_use]
    pub const fn as_vector_store(&self) -> Option<&VectorStoreError> {
        match self {
            Self::VectorStoreError(err) => Some(err),
            Self::EmptyQuery => None,
        }
    }

    /// Whether the index must be rebuilt with the live embedding configuration
    #[must_use]
    pub const fn needs_reindex(&self) -> bool {
        matches!(
            self,
            Self::VectorStoreError(VectorStoreError::DimensionMismatch { .. })
        )
    }
}
