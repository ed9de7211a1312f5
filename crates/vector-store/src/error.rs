use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// The endpoint refused the request itself (4xx other than 429)
    #[error("Embedding request rejected ({status}): {message}")]
    EmbeddingRejected { status: u16, message: String },

    #[error("Invalid embedding configuration: {0}")]
    InvalidConfig(String),

    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index not found for namespace '{0}'")]
    IndexNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid namespace '{0}'")]
    InvalidNamespace(String),

    #[error("Misaligned records: {texts} texts, {metadata} metadata entries, {vectors} vectors")]
    Misaligned {
        texts: usize,
        metadata: usize,
        vectors: usize,
    },

    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },
}

impl VectorStoreError {
    /// Whether a caller may retry the failed operation with backoff
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::EmbeddingError(_) | Self::Timeout { .. })
    }

    /// Whether the error belongs to the persistence kind (I/O or decoding during save/load)
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::IoError(_) | Self::SerializationError(_)
        )
    }

    pub(crate) fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
