use crate::error::{IndexerError, Result};
use async_trait::async_trait;
use docqa_chunker::PageText;
use std::path::Path;

/// Page separator recognised in plain-text documents
pub const FORM_FEED: char = '\x0c';

/// Extracted text of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Name recorded as `source` in chunk metadata
    pub source_name: String,
    pub body: DocumentBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBody {
    /// Continuous text with no page structure
    Text(String),
    /// Text split into numbered pages
    Pages(Vec<PageText>),
}

impl ParsedDocument {
    pub fn text(source_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            body: DocumentBody::Text(text.into()),
        }
    }

    pub fn pages(source_name: impl Into<String>, pages: Vec<PageText>) -> Self {
        Self {
            source_name: source_name.into(),
            body: DocumentBody::Pages(pages),
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        match &self.body {
            DocumentBody::Text(_) => 1,
            DocumentBody::Pages(pages) => pages.len(),
        }
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        match &self.body {
            DocumentBody::Text(text) => text.split_whitespace().count(),
            DocumentBody::Pages(pages) => pages
                .iter()
                .map(|page| page.text.split_whitespace().count())
                .sum(),
        }
    }
}

/// Turns a file on disk into text the chunker can consume.
///
/// Binary formats (PDF, DOCX, mail) plug in here; the engine only sees
/// [`ParsedDocument`].
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, path: &Path) -> Result<ParsedDocument>;
}

/// UTF-8 text files; form feeds split pages
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    /// Parse in-memory text the way [`DocumentParser::parse`] parses a file
    #[must_use]
    pub fn parse_str(source_name: &str, raw: &str) -> ParsedDocument {
        if !raw.contains(FORM_FEED) {
            return ParsedDocument::text(source_name, raw);
        }

        let mut pages: Vec<PageText> = raw
            .split(FORM_FEED)
            .enumerate()
            .map(|(i, text)| PageText {
                number: u32::try_from(i + 1).unwrap_or(u32::MAX),
                text: text.to_string(),
            })
            .collect();
        // A document ending in a form feed has no trailing page.
        if pages.len() > 1 && pages.last().is_some_and(|p| p.text.trim().is_empty()) {
            pages.pop();
        }
        ParsedDocument::pages(source_name, pages)
    }
}

#[async_trait]
impl DocumentParser for PlainTextParser {
    async fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(IndexerError::DocumentNotFound(path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };
        let raw = String::from_utf8(bytes).map_err(|err| IndexerError::Parse {
            path: path.to_path_buf(),
            reason: format!("not valid UTF-8 ({})", err.utf8_error()),
        })?;

        let source_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or_else(|| path.display().to_string(), str::to_string);
        let parsed = Self::parse_str(&source_name, &raw);
        log::debug!(
            "Parsed {} ({} pages, {} words)",
            path.display(),
            parsed.page_count(),
            parsed.word_count()
        );
        Ok(parsed)
    }
}
