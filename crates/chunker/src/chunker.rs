use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::types::{Chunk, ChunkMetadata, PageText};
use std::ops::Range;

/// Splits document text into overlapping word windows
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting parameters that cannot make progress
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk a whole document.
    ///
    /// Empty or whitespace-only input yields no chunks.
    #[must_use]
    pub fn chunk_str(&self, text: &str, source_name: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();
        self.push_windows(&words, 0, None, source_name, &mut chunks);
        log::debug!(
            "Chunked {source_name}: {} words -> {} chunks",
            words.len(),
            chunks.len()
        );
        chunks
    }

    /// Chunk a document that arrives split into pages.
    ///
    /// Windows never straddle a page boundary. Word ranges stay global to the
    /// document and chunk indexes continue across pages.
    #[must_use]
    pub fn chunk_pages(&self, pages: &[PageText], source_name: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut offset = 0;
        for page in pages {
            let words: Vec<&str> = page.text.split_whitespace().collect();
            self.push_windows(&words, offset, Some(page.number), source_name, &mut chunks);
            offset += words.len();
        }
        log::debug!(
            "Chunked {source_name}: {} pages, {offset} words -> {} chunks",
            pages.len(),
            chunks.len()
        );
        chunks
    }

    fn push_windows(
        &self,
        words: &[&str],
        offset: usize,
        page: Option<u32>,
        source_name: &str,
        out: &mut Vec<Chunk>,
    ) {
        for range in window_ranges(words.len(), &self.config) {
            let content = words[range.clone()].join(" ");
            out.push(Chunk {
                content,
                source_name: source_name.to_string(),
                chunk_index: out.len(),
                word_range: (range.start + offset)..(range.end + offset),
                page,
            });
        }
    }
}

/// Chunk `text` and return the parallel `(texts, metadata)` sequences an index is built from
pub fn chunk(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    source_name: &str,
) -> Result<(Vec<String>, Vec<ChunkMetadata>)> {
    let chunker = Chunker::new(ChunkerConfig::new(chunk_size, overlap))?;
    let chunks = chunker.chunk_str(text, source_name);
    let metadata = chunks.iter().map(Chunk::metadata).collect();
    let texts = chunks.into_iter().map(|c| c.content).collect();
    Ok((texts, metadata))
}

/// Window boundaries over `total` words.
///
/// A window starts every `stride` words while the start is still inside the
/// sequence, so the tail may repeat in shorter windows already covered by
/// their predecessor.
fn window_ranges(total: usize, config: &ChunkerConfig) -> Vec<Range<usize>> {
    let stride = config.stride();
    (0..total)
        .step_by(stride)
        .map(|start| start..start.saturating_add(config.chunk_size).min(total))
        .collect()
}
