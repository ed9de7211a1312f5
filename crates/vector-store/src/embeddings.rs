use crate::error::{Result, VectorStoreError};
use crate::http_embedder::HttpEmbedder;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MODEL_ID: &str = "BAAI/bge-base-en-v1.5";
pub const DEFAULT_DIMENSION: usize = 768;
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Maps text to fixed-width vectors.
///
/// One vector per input, in input order, every vector `dimension()` wide.
/// Failures surface as [`VectorStoreError::EmbeddingError`], which callers
/// may retry (see [`crate::embed_with_retry`]).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the model configuration, persisted next to every index
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".to_string()))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// Deterministic offline vectors
    Stub,
    /// OpenAI-compatible `/embeddings` endpoint
    Http,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "http" => Ok(Self::Http),
            other => Err(VectorStoreError::invalid_config(format!(
                "Unsupported DOCQA_EMBEDDING_MODE '{other}' (expected 'stub' or 'http')"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::Http => "http",
        }
    }
}

/// How to reach the embedding model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub model_id: String,
    pub dimension: usize,
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Stub,
            model_id: DEFAULT_MODEL_ID.to_string(),
            dimension: DEFAULT_DIMENSION,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl EmbeddingConfig {
    #[must_use]
    pub fn stub(dimension: usize) -> Self {
        Self {
            mode: EmbeddingMode::Stub,
            dimension,
            ..Self::default()
        }
    }

    /// Apply `DOCQA_EMBEDDING_*` values from `lookup` on top of `self`.
    ///
    /// Unset or blank values keep the current setting.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get("DOCQA_EMBEDDING_MODE") {
            self.mode = EmbeddingMode::parse(&raw)?;
        }
        if let Some(model) = get("DOCQA_EMBEDDING_MODEL") {
            self.model_id = model.trim().to_string();
        }
        if let Some(raw) = get("DOCQA_EMBEDDING_DIM") {
            self.dimension = raw.trim().parse::<usize>().map_err(|_| {
                VectorStoreError::invalid_config(format!("Invalid DOCQA_EMBEDDING_DIM '{raw}'"))
            })?;
        }
        if let Some(url) = get("DOCQA_EMBEDDING_URL") {
            self.base_url = url.trim().to_string();
        }
        if let Some(key) = get("DOCQA_EMBEDDING_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(raw) = get("DOCQA_EMBEDDING_TIMEOUT_MS") {
            let ms = raw.trim().parse::<u64>().map_err(|_| {
                VectorStoreError::invalid_config(format!(
                    "Invalid DOCQA_EMBEDDING_TIMEOUT_MS '{raw}'"
                ))
            })?;
            self.request_timeout = Duration::from_millis(ms);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(VectorStoreError::invalid_config(
                "embedding dimension must be > 0",
            ));
        }
        if self.mode == EmbeddingMode::Http && self.model_id.trim().is_empty() {
            return Err(VectorStoreError::invalid_config(
                "missing embedding model name",
            ));
        }
        Ok(())
    }
}

/// Construct a fresh provider for `config`
pub fn build_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    config.validate()?;
    let provider: Arc<dyn EmbeddingProvider> = match config.mode {
        EmbeddingMode::Stub => Arc::new(StubEmbedder::new(config.dimension)),
        EmbeddingMode::Http => Arc::new(HttpEmbedder::new(config)?),
    };
    log::info!(
        "Embedding provider ready: mode={} model={} dim={}",
        config.mode.as_str(),
        provider.model_id(),
        provider.dimension()
    );
    Ok(provider)
}

static SHARED_PROVIDER: OnceCell<Arc<dyn EmbeddingProvider>> = OnceCell::new();

/// Process-wide provider, initialised once on first use.
///
/// Later calls return the same handle; their `config` is ignored.
pub fn shared_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    SHARED_PROVIDER
        .get_or_try_init(|| build_provider(config))
        .cloned()
}

/// Reject provider output whose shape does not match the request
pub fn validate_embeddings(expected_count: usize, vectors: &[Vec<f32>], dimension: usize) -> Result<()> {
    if vectors.len() != expected_count {
        return Err(VectorStoreError::EmbeddingError(format!(
            "provider returned {} embeddings for {expected_count} inputs",
            vectors.len()
        )));
    }
    if let Some((pos, bad)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dimension) {
        return Err(VectorStoreError::EmbeddingError(format!(
            "embedding {pos} has width {} (expected {dimension})",
            bad.len()
        )));
    }
    Ok(())
}

/// Deterministic hash-seeded embeddings for tests and offline runs.
///
/// Identical text always maps to the identical unit vector.
#[derive(Clone, Debug)]
pub struct StubEmbedder {
    dimension: usize,
    model_id: String,
}

impl StubEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: format!("stub-{dimension}"),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vec.iter_mut() {
            *x /= norm;
        }
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
