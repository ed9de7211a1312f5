use anyhow::{Context, Result};
use docqa_chunker::{ChunkerConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use docqa_vector_store::{
    EmbeddingConfig, EmbeddingMode, RetryPolicy, DEFAULT_INDEX_DIR_NAME,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// `docqa.toml` layout; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub top_k: Option<usize>,
    pub index_dir: Option<PathBuf>,
    pub embedding: FileEmbeddingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileEmbeddingConfig {
    pub mode: Option<String>,
    pub model: Option<String>,
    pub dimension: Option<usize>,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_attempts: Option<usize>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub index_dir: Option<PathBuf>,
    pub embed_mode: Option<EmbeddingMode>,
    pub embed_model: Option<String>,
    pub embed_dim: Option<usize>,
}

/// Fully resolved settings for one process
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub chunker: ChunkerConfig,
    pub top_k: usize,
    pub index_dir: PathBuf,
    pub embedding: EmbeddingConfig,
    pub max_attempts: usize,
}

impl EngineConfig {
    /// Resolve from the process environment and an optional config file
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Layering: flag, then env var, then file, then default
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let env_parse = |key: &str| -> Result<Option<usize>> {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| {
                    v.trim()
                        .parse::<usize>()
                        .with_context(|| format!("Invalid {key} '{v}'"))
                })
                .transpose()
        };

        let chunk_size = overrides
            .chunk_size
            .or(env_parse("DOCQA_CHUNK_SIZE")?)
            .or(file.chunk_size)
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        let chunk_overlap = overrides
            .chunk_overlap
            .or(env_parse("DOCQA_CHUNK_OVERLAP")?)
            .or(file.chunk_overlap)
            .unwrap_or(DEFAULT_CHUNK_OVERLAP);
        let top_k = env_parse("DOCQA_TOP_K")?
            .or(file.top_k)
            .unwrap_or(DEFAULT_TOP_K);
        let index_dir = overrides
            .index_dir
            .clone()
            .or_else(|| env("DOCQA_INDEX_DIR").filter(|v| !v.trim().is_empty()).map(PathBuf::from))
            .or(file.index_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR_NAME));
        let max_attempts = env_parse("DOCQA_EMBEDDING_MAX_ATTEMPTS")?
            .or(file.embedding.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        let mut embedding = file_embedding(&file.embedding)?
            .overlay(&env)
            .context("Invalid embedding configuration")?;
        if let Some(mode) = overrides.embed_mode {
            embedding.mode = mode;
        }
        if let Some(model) = &overrides.embed_model {
            embedding.model_id.clone_from(model);
        }
        if let Some(dim) = overrides.embed_dim {
            embedding.dimension = dim;
        }
        embedding
            .validate()
            .context("Invalid embedding configuration")?;

        let chunker = ChunkerConfig::new(chunk_size, chunk_overlap);
        chunker.validate()?;
        if top_k == 0 {
            anyhow::bail!("top_k must be > 0");
        }
        if max_attempts == 0 {
            anyhow::bail!("DOCQA_EMBEDDING_MAX_ATTEMPTS must be > 0");
        }

        Ok(Self {
            chunker,
            top_k,
            index_dir,
            embedding,
            max_attempts,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            timeout: Some(self.embedding.request_timeout),
            ..RetryPolicy::default()
        }
    }
}

fn file_embedding(file: &FileEmbeddingConfig) -> Result<EmbeddingConfig> {
    let mut config = EmbeddingConfig::default();
    if let Some(mode) = &file.mode {
        config.mode = EmbeddingMode::parse(mode)?;
    }
    if let Some(model) = &file.model {
        config.model_id.clone_from(model);
    }
    if let Some(dim) = file.dimension {
        config.dimension = dim;
    }
    if let Some(url) = &file.url {
        config.base_url.clone_from(url);
    }
    if file.api_key.is_some() {
        config.api_key.clone_from(&file.api_key);
    }
    if let Some(ms) = file.timeout_ms {
        config.request_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}
