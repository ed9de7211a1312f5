use docqa_chunker::ChunkerError;
use docqa_indexer::IndexerError;
use docqa_retriever::SearchError;
use docqa_vector_store::VectorStoreError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// Stable machine-readable kind, e.g. `index_not_found`
    pub kind: &'static str,
    pub message: String,
}

/// Envelope printed on stdout in `--json` mode
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl CommandResponse {
    pub const fn ok(data: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            error: None,
            data,
        }
    }

    pub fn error(err: &anyhow::Error) -> Self {
        Self {
            status: CommandStatus::Error,
            error: Some(ErrorEnvelope {
                kind: classify_error(err),
                message: format!("{err:#}"),
            }),
            data: Value::Null,
        }
    }
}

/// Map an error chain to a stable kind
pub fn classify_error(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<VectorStoreError>() {
            return vector_store_kind(err);
        }
        if let Some(err) = cause.downcast_ref::<ChunkerError>() {
            return chunker_kind(err);
        }
        if let Some(err) = cause.downcast_ref::<IndexerError>() {
            match err {
                IndexerError::VectorStoreError(inner) => return vector_store_kind(inner),
                IndexerError::ChunkerError(inner) => return chunker_kind(inner),
                IndexerError::DocumentNotFound(_) => return "document_not_found",
                IndexerError::Parse { .. } => return "parse_error",
                IndexerError::IoError(_) => return "persistence",
            }
        }
        if let Some(err) = cause.downcast_ref::<SearchError>() {
            match err {
                SearchError::VectorStoreError(inner) => return vector_store_kind(inner),
                SearchError::EmptyQuery => return "empty_query",
            }
        }
    }
    "internal"
}

fn chunker_kind(err: &ChunkerError) -> &'static str {
    match err {
        ChunkerError::InvalidChunkParameters { .. } => "invalid_chunk_parameters",
        ChunkerError::InvalidConfig(_) => "invalid_config",
    }
}

fn vector_store_kind(err: &VectorStoreError) -> &'static str {
    match err {
        VectorStoreError::EmbeddingError(_) => "embedding_error",
        VectorStoreError::EmbeddingRejected { .. } => "embedding_rejected",
        VectorStoreError::InvalidConfig(_) => "invalid_config",
        VectorStoreError::Timeout { .. } => "timeout",
        VectorStoreError::DimensionMismatch { .. } => "dimension_mismatch",
        VectorStoreError::IndexNotFound(_) => "index_not_found",
        VectorStoreError::InvalidNamespace(_) => "invalid_namespace",
        VectorStoreError::Misaligned { .. } => "misaligned",
        VectorStoreError::Persistence(_)
        | VectorStoreError::IoError(_)
        | VectorStoreError::SerializationError(_) => "persistence",
    }
}
