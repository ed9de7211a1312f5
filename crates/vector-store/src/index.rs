use crate::error::{Result, VectorStoreError};
use crate::flat_index::{FlatIndex, Neighbor};
use crate::paths::validate_namespace;
use docqa_chunker::{Chunk, ChunkMetadata};

/// One chunk paired with its embedding
#[derive(Debug, Clone, Copy)]
pub struct VectorRecord<'a> {
    pub position: usize,
    pub text: &'a str,
    pub metadata: &'a ChunkMetadata,
    pub embedding: &'a [f32],
}

/// Immutable retrieval space for one namespace.
///
/// Position `i` binds the i-th text, the i-th metadata entry and the i-th
/// embedding row; the three sequences always have equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    namespace: String,
    model_id: Option<String>,
    texts: Vec<String>,
    metadata: Vec<ChunkMetadata>,
    vectors: FlatIndex,
}

impl VectorIndex {
    /// Build from parallel texts, metadata and embeddings
    pub fn build(
        namespace: impl Into<String>,
        dimension: usize,
        texts: Vec<String>,
        metadata: Vec<ChunkMetadata>,
        embeddings: &[Vec<f32>],
    ) -> Result<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        ensure_aligned(texts.len(), metadata.len(), embeddings.len())?;
        let vectors = FlatIndex::build(dimension, embeddings)?;
        log::debug!(
            "Built index '{namespace}': {} records, dim {dimension}",
            vectors.len()
        );
        Ok(Self {
            namespace,
            model_id: None,
            texts,
            metadata,
            vectors,
        })
    }

    /// Build from chunker output and one embedding per chunk
    pub fn from_chunks(
        namespace: impl Into<String>,
        dimension: usize,
        chunks: Vec<Chunk>,
        embeddings: &[Vec<f32>],
    ) -> Result<Self> {
        let metadata = chunks.iter().map(Chunk::metadata).collect();
        let texts = chunks.into_iter().map(|c| c.content).collect();
        Self::build(namespace, dimension, texts, metadata, embeddings)
    }

    pub(crate) fn from_parts(
        namespace: String,
        model_id: Option<String>,
        texts: Vec<String>,
        metadata: Vec<ChunkMetadata>,
        vectors: FlatIndex,
    ) -> Result<Self> {
        ensure_aligned(texts.len(), metadata.len(), vectors.len())?;
        Ok(Self {
            namespace,
            model_id,
            texts,
            metadata,
            vectors,
        })
    }

    /// Builder: record which embedding model produced the vectors
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    #[must_use]
    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    #[must_use]
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    #[must_use]
    pub fn metadata(&self) -> &[ChunkMetadata] {
        &self.metadata
    }

    pub(crate) const fn vectors(&self) -> &FlatIndex {
        &self.vectors
    }

    #[must_use]
    pub fn record(&self, position: usize) -> Option<VectorRecord<'_>> {
        let text = self.texts.get(position)?;
        let metadata = self.metadata.get(position)?;
        let embedding = self.vectors.vector(position)?.to_slice()?;
        Some(VectorRecord {
            position,
            text,
            metadata,
            embedding,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = VectorRecord<'_>> {
        (0..self.len()).filter_map(|position| self.record(position))
    }

    /// Exact nearest neighbours of `query`.
    ///
    /// A query of the wrong width is a [`VectorStoreError::DimensionMismatch`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.vectors.search(query, k)
    }
}

fn ensure_aligned(texts: usize, metadata: usize, vectors: usize) -> Result<()> {
    if texts == metadata && metadata == vectors {
        Ok(())
    } else {
        Err(VectorStoreError::Misaligned {
            texts,
            metadata,
            vectors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(i: usize) -> ChunkMetadata {
        ChunkMetadata {
            source: "doc.txt".to_string(),
            page: None,
            chunk_index: i,
            word_count: 1,
            char_range: format!("{i}-{}", i + 1),
        }
    }

    fn sample() -> VectorIndex {
        VectorIndex::build(
            "doc",
            2,
            vec!["north".into(), "east".into(), "south".into()],
            (0..3).map(meta).collect(),
            &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, -1.0]],
        )
        .unwrap()
    }

    #[test]
    fn records_stay_positionally_bound() {
        let index = sample();
        let east = index.record(1).unwrap();
        assert_eq!(east.text, "east");
        assert_eq!(east.metadata.chunk_index, 1);
        assert_eq!(east.embedding, &[1.0, 0.0]);
        assert_eq!(index.records().count(), 3);
        assert!(index.record(3).is_none());
    }

    #[test]
    fn search_maps_back_to_text() {
        let index = sample();
        let hits = index.search(&[0.9, 0.1], 1).unwrap();
        assert_eq!(index.texts()[hits[0].position], "east");
    }

    #[test]
    fn misaligned_inputs_are_rejected() {
        let err = VectorIndex::build(
            "doc",
            2,
            vec!["a".into(), "b".into()],
            vec![meta(0)],
            &[vec![0.0, 1.0], vec![1.0, 0.0]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::Misaligned {
                texts: 2,
                metadata: 1,
                vectors: 2
            }
        ));
    }

    #[test]
    fn bad_namespace_is_rejected() {
        let err = VectorIndex::build("../etc", 2, vec![], vec![], &[]).unwrap_err();
        assert!(matches!(err, VectorStoreError::InvalidNamespace(_)));
    }

    #[test]
    fn empty_index_keeps_dimension() {
        let index = VectorIndex::build("empty", 384, vec![], vec![], &[]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 384);
        assert!(index.search(&vec![0.0; 384], 5).unwrap().is_empty());
    }
}
