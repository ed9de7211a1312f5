use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An immutable window of document text, the unit of retrieval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Window text: the window's words joined by single spaces
    pub content: String,

    /// Identifier of the originating document (file name, URL, ...)
    pub source_name: String,

    /// Zero-based position of this chunk within its document
    pub chunk_index: usize,

    /// Half-open interval over the document's word sequence
    pub word_range: Range<usize>,

    /// Page number the window was cut from, when the parser reported pages
    pub page: Option<u32>,
}

impl Chunk {
    /// Number of whitespace-delimited tokens in `content`
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.word_range.len()
    }

    /// Check if chunk covers a specific word offset
    #[must_use]
    pub fn contains_word(&self, offset: usize) -> bool {
        self.word_range.contains(&offset)
    }

    /// Metadata record exposed across the persistence boundary
    #[must_use]
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            source: self.source_name.clone(),
            page: self.page,
            chunk_index: self.chunk_index,
            word_count: self.word_count(),
            char_range: format!("{}-{}", self.word_range.start, self.word_range.end),
        }
    }
}

/// Provenance of a chunk, stored position-for-position next to its text
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChunkMetadata {
    /// Origin file or URL
    pub source: String,

    /// Page in the original document
    #[serde(default)]
    pub page: Option<u32>,

    pub chunk_index: usize,

    pub word_count: usize,

    /// Word-offset span, e.g. `"450-950"` (not byte offsets)
    pub char_range: String,
}

impl ChunkMetadata {
    /// Parse `char_range` back into a word range
    #[must_use]
    pub fn word_range(&self) -> Option<Range<usize>> {
        let (start, end) = self.char_range.split_once('-')?;
        let start = start.trim().parse::<usize>().ok()?;
        let end = end.trim().parse::<usize>().ok()?;
        (start <= end).then_some(start..end)
    }
}

/// Text of one page as handed over by a document parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

impl PageText {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(range: Range<usize>) -> Chunk {
        Chunk {
            content: "a b c".to_string(),
            source_name: "policy.pdf".to_string(),
            chunk_index: 2,
            word_range: range,
            page: Some(4),
        }
    }

    #[test]
    fn metadata_mirrors_chunk() {
        let meta = chunk(450..950).metadata();
        assert_eq!(meta.source, "policy.pdf");
        assert_eq!(meta.page, Some(4));
        assert_eq!(meta.chunk_index, 2);
        assert_eq!(meta.word_count, 500);
        assert_eq!(meta.char_range, "450-950");
    }

    #[test]
    fn char_range_parses_back() {
        let meta = chunk(900..1200).metadata();
        assert_eq!(meta.word_range(), Some(900..1200));

        let broken = ChunkMetadata {
            char_range: "12".to_string(),
            ..Default::default()
        };
        assert_eq!(broken.word_range(), None);
    }

    #[test]
    fn contains_word_is_half_open() {
        let chunk = chunk(10..15);
        assert!(chunk.contains_word(10));
        assert!(chunk.contains_word(14));
        assert!(!chunk.contains_word(15));
        assert!(!chunk.contains_word(9));
    }

    #[test]
    fn missing_page_deserializes_as_none() {
        let meta: ChunkMetadata = serde_json::from_str(
            r#"{"source":"a.txt","chunk_index":0,"word_count":3,"char_range":"0-3"}"#,
        )
        .unwrap();
        assert_eq!(meta.page, None);
    }
}
