use crate::config::EngineConfig;
use anyhow::{Context, Result};
use docqa_indexer::{DocumentIndexer, IndexStats};
use docqa_retriever::{citations, join_context, Citation, Retriever, ScoredChunk};
use docqa_vector_store::{shared_provider, IndexStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";
const PREVIEW_CHARS: usize = 160;

/// Result of one subcommand, printable as JSON or text
pub trait Report: Serialize {
    fn human(&self) -> String;
}

#[derive(Debug, Serialize)]
pub struct IndexOutput {
    #[serde(flatten)]
    pub stats: IndexStats,
    pub index_dir: PathBuf,
}

impl Report for IndexOutput {
    fn human(&self) -> String {
        let s = &self.stats;
        let mut out = format!(
            "Indexed {} into '{}': {} chunks from {} words ({} pages), dim {}, model {}",
            s.source, s.namespace, s.chunks, s.words, s.pages, s.dimension, s.model_id
        );
        if s.persisted {
            let _ = write!(out, "\nSaved under {}", self.index_dir.display());
        } else {
            out.push_str("\nNot saved (--no-save)");
        }
        out
    }
}

pub async fn run_index(
    config: &EngineConfig,
    file: &Path,
    namespace: Option<String>,
    persist: bool,
) -> Result<IndexOutput> {
    let namespace = match namespace {
        Some(ns) => ns,
        None => default_namespace(file)?,
    };
    let provider = shared_provider(&config.embedding)?;
    let indexer = DocumentIndexer::new(provider, IndexStore::new(&config.index_dir), config.chunker)?
        .with_retry(config.retry_policy());
    let (_, stats) = indexer
        .index_file(&namespace, file, persist)
        .await
        .with_context(|| format!("Failed to index {}", file.display()))?;
    Ok(IndexOutput {
        stats,
        index_dir: config.index_dir.clone(),
    })
}

fn default_namespace(file: &Path) -> Result<String> {
    file.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("Cannot derive a namespace from {}; pass --namespace", file.display()))
}

#[derive(Debug, Serialize)]
pub struct QueryResults {
    pub query: String,
    pub results: Vec<ScoredChunk>,
    pub citations: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub namespace: String,
    pub k: usize,
    pub queries: Vec<QueryResults>,
}

impl Report for SearchOutput {
    fn human(&self) -> String {
        let mut out = String::new();
        for q in &self.queries {
            let _ = writeln!(out, "Query: {}", q.query);
            if q.results.is_empty() {
                out.push_str("  (no chunks)\n");
            }
            for (rank, hit) in q.results.iter().enumerate() {
                let page = hit
                    .metadata
                    .page
                    .map(|p| format!(" p.{p}"))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  {}. [{}{} #{} words {}] distance={:.4}\n     {}",
                    rank + 1,
                    hit.metadata.source,
                    page,
                    hit.metadata.chunk_index,
                    hit.metadata.char_range,
                    hit.distance,
                    preview(&hit.content)
                );
            }
            if !q.citations.is_empty() {
                let sources: Vec<String> = q.citations.iter().map(ToString::to_string).collect();
                let _ = writeln!(out, "  Sources: {}", sources.join("; "));
            }
            if let Some(context) = &q.context {
                let _ = writeln!(out, "\n{context}");
            }
        }
        out.trim_end().to_string()
    }
}

pub async fn run_search(
    config: &EngineConfig,
    queries: Vec<String>,
    namespace: &str,
    k: Option<usize>,
    with_context: bool,
) -> Result<SearchOutput> {
    let k = k.unwrap_or(config.top_k);
    if k == 0 {
        anyhow::bail!("-k must be > 0");
    }
    let provider = shared_provider(&config.embedding)?;
    let retriever = Retriever::new(provider, IndexStore::new(&config.index_dir))
        .with_retry(config.retry_policy());

    let hits = if let [query] = queries.as_slice() {
        vec![retriever.retrieve(query, namespace, k).await?]
    } else {
        retriever.retrieve_many(&queries, namespace, k).await?
    };

    let queries = queries
        .into_iter()
        .zip(hits)
        .map(|(query, results)| QueryResults {
            citations: citations(&results),
            context: with_context.then(|| join_context(&results, CONTEXT_SEPARATOR)),
            query,
            results,
        })
        .collect();
    Ok(SearchOutput {
        namespace: namespace.to_string(),
        k,
        queries,
    })
}

#[derive(Debug, Serialize)]
pub struct NamespacesOutput {
    pub index_dir: PathBuf,
    pub namespaces: Vec<String>,
}

impl Report for NamespacesOutput {
    fn human(&self) -> String {
        if self.namespaces.is_empty() {
            return format!("No namespaces under {}", self.index_dir.display());
        }
        self.namespaces.join("\n")
    }
}

pub async fn run_namespaces(config: &EngineConfig) -> Result<NamespacesOutput> {
    let namespaces = IndexStore::new(&config.index_dir).namespaces().await?;
    Ok(NamespacesOutput {
        index_dir: config.index_dir.clone(),
        namespaces,
    })
}

#[derive(Debug, Serialize)]
pub struct ChunkPreview {
    pub chunk_index: usize,
    pub char_range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub namespace: String,
    pub dimension: usize,
    pub model_id: Option<String>,
    pub chunks: usize,
    /// Chunk count per source
    pub sources: BTreeMap<String, usize>,
    pub preview: Vec<ChunkPreview>,
}

impl Report for InspectOutput {
    fn human(&self) -> String {
        let mut out = format!(
            "Namespace '{}': {} chunks, dim {}, model {}",
            self.namespace,
            self.chunks,
            self.dimension,
            self.model_id.as_deref().unwrap_or("unknown")
        );
        for (source, count) in &self.sources {
            let _ = write!(out, "\n  {source}: {count} chunks");
        }
        for chunk in &self.preview {
            let _ = write!(
                out,
                "\n  #{} [{}] {}",
                chunk.chunk_index,
                chunk.char_range,
                preview(&chunk.text)
            );
        }
        out
    }
}

pub async fn run_inspect(
    config: &EngineConfig,
    namespace: &str,
    preview_count: usize,
) -> Result<InspectOutput> {
    let index = IndexStore::new(&config.index_dir).load(namespace).await?;

    let mut sources = BTreeMap::new();
    for meta in index.metadata() {
        *sources.entry(meta.source.clone()).or_insert(0) += 1;
    }
    let preview = index
        .records()
        .take(preview_count)
        .map(|record| ChunkPreview {
            chunk_index: record.metadata.chunk_index,
            char_range: record.metadata.char_range.clone(),
            page: record.metadata.page,
            text: record.text.to_string(),
        })
        .collect();

    Ok(InspectOutput {
        namespace: index.namespace().to_string(),
        dimension: index.dimension(),
        model_id: index.model_id().map(str::to_string),
        chunks: index.len(),
        sources,
        preview,
    })
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}...")
}
