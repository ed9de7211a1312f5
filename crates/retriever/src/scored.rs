use docqa_chunker::ChunkMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One retrieved chunk with its squared-L2 distance to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// A distinct document location referenced by a result list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} (p. {page})", self.source),
            None => f.write_str(&self.source),
        }
    }
}

/// Distinct `(source, page)` pairs in rank order of first appearance
#[must_use]
pub fn citations(results: &[ScoredChunk]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    results
        .iter()
        .map(|r| Citation {
            source: r.metadata.source.clone(),
            page: r.metadata.page,
        })
        .filter(|citation| seen.insert(citation.clone()))
        .collect()
}

/// Chunk contents in rank order, joined for an answer-generation prompt
#[must_use]
pub fn join_context(results: &[ScoredChunk], separator: &str) -> String {
    results
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}
