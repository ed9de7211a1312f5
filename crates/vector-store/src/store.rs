use crate::error::{Result, VectorStoreError};
use crate::flat_index::FlatIndex;
use crate::index::VectorIndex;
use crate::index_lock::{acquire_namespace_lock, LockMode};
use crate::paths::{
    is_generation, namespace_from_meta_file, NamespacePaths, DEFAULT_INDEX_DIR_NAME,
    GENERATION_LEN,
};
use docqa_chunker::ChunkMetadata;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const INDEX_SCHEMA_VERSION: u32 = 2;

const VECTOR_MAGIC: &[u8; 4] = b"DQV1";
const VECTOR_HEADER_LEN: usize = 12;

/// Metadata record persisted next to the vector blob
#[derive(Debug, Serialize, Deserialize)]
struct PersistedMeta {
    schema_version: u32,
    namespace: String,
    dimension: usize,
    #[serde(default)]
    model_id: Option<String>,
    /// Names the vector blob `N.<generation>.index` this record commits
    vectors_generation: String,
    /// Binds this record to exactly one vector blob
    vectors_sha256: String,
    texts: Vec<String>,
    metadata: Vec<ChunkMetadata>,
}

/// Just enough of a metadata record to find its vector blob
#[derive(Deserialize)]
struct CommittedGeneration {
    vectors_generation: String,
}

/// Durable save/load of [`VectorIndex`] values keyed by namespace.
///
/// Layout per namespace `N` under `root`: `N.<generation>.index` (vector
/// blob), `N.meta.json` (texts, metadata, dimension, generation) and
/// `N.lock`. A save writes the new blob next to the old one and then renames
/// the metadata record into place; that rename is the commit. A save that
/// fails or is dropped before it leaves the previous generation loadable.
/// Saves hold the lock exclusively and loads hold it shared.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_DIR_NAME)
    }
}

impl IndexStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `index`, replacing whatever the namespace held before
    pub async fn save(&self, index: &VectorIndex) -> Result<()> {
        let paths = NamespacePaths::new(&self.root, index.namespace())?;
        tokio::fs::create_dir_all(&self.root).await?;

        let blob = encode_vectors(index.vectors())?;
        let vectors_sha256 = sha256_hex(&blob);
        let generation = vectors_sha256[..GENERATION_LEN].to_string();
        let meta = PersistedMeta {
            schema_version: INDEX_SCHEMA_VERSION,
            namespace: index.namespace().to_string(),
            dimension: index.dimension(),
            model_id: index.model_id().map(str::to_string),
            vectors_generation: generation.clone(),
            vectors_sha256,
            texts: index.texts().to_vec(),
            metadata: index.metadata().to_vec(),
        };
        let meta_bytes = serde_json::to_vec(&meta)?;

        let _lock = acquire_namespace_lock(&paths.lock, LockMode::Exclusive).await?;
        let previous = committed_generation(&paths).await.unwrap_or_default();
        let blob_path = paths.vectors(&generation);
        write_replace(&blob_path, &blob).await?;
        if let Err(err) = write_replace(&paths.meta, &meta_bytes).await {
            if previous.as_deref() != Some(generation.as_str()) {
                let _ = tokio::fs::remove_file(&blob_path).await;
            }
            return Err(err);
        }
        self.remove_stale_blobs(&paths, &generation).await;

        log::info!(
            "Saved namespace '{}' ({} chunks, dim {}) to {}",
            index.namespace(),
            index.len(),
            index.dimension(),
            self.root.display()
        );
        Ok(())
    }

    /// Load a namespace; fails with `IndexNotFound` if either file is absent
    pub async fn load(&self, namespace: &str) -> Result<VectorIndex> {
        let paths = NamespacePaths::new(&self.root, namespace)?;
        if !tokio::fs::try_exists(&paths.meta).await? {
            return Err(VectorStoreError::IndexNotFound(namespace.to_string()));
        }

        let (meta, blob) = {
            let _lock = acquire_namespace_lock(&paths.lock, LockMode::Shared).await?;
            let meta_bytes = read_namespace_file(&paths.meta, namespace).await?;
            let meta: PersistedMeta = serde_json::from_slice(&meta_bytes)?;
            if meta.schema_version != INDEX_SCHEMA_VERSION {
                return Err(VectorStoreError::persistence(format!(
                    "Unsupported index schema_version {} (expected {INDEX_SCHEMA_VERSION})",
                    meta.schema_version
                )));
            }
            if !is_generation(&meta.vectors_generation) {
                return Err(VectorStoreError::persistence(format!(
                    "metadata record for '{namespace}' names malformed generation '{}'",
                    meta.vectors_generation
                )));
            }
            let blob =
                read_namespace_file(&paths.vectors(&meta.vectors_generation), namespace).await?;
            (meta, blob)
        };

        if meta.namespace != namespace {
            return Err(VectorStoreError::persistence(format!(
                "metadata record for '{namespace}' names namespace '{}'",
                meta.namespace
            )));
        }
        if sha256_hex(&blob) != meta.vectors_sha256 {
            return Err(VectorStoreError::persistence(format!(
                "torn namespace '{namespace}': vector blob does not match its metadata record"
            )));
        }

        let (blob_dimension, count, values) = decode_vectors(&blob)?;
        if blob_dimension != meta.dimension {
            return Err(VectorStoreError::persistence(format!(
                "vector blob dimension {blob_dimension} differs from recorded dimension {}",
                meta.dimension
            )));
        }

        let vectors = FlatIndex::from_flat(meta.dimension, count, values)?;
        let index = VectorIndex::from_parts(
            meta.namespace,
            meta.model_id,
            meta.texts,
            meta.metadata,
            vectors,
        )?;
        log::debug!(
            "Loaded namespace '{namespace}' ({} chunks, dim {})",
            index.len(),
            index.dimension()
        );
        Ok(index)
    }

    /// Whether the metadata record of `namespace` and the blob it names are on disk
    pub async fn exists(&self, namespace: &str) -> Result<bool> {
        let paths = NamespacePaths::new(&self.root, namespace)?;
        match committed_generation(&paths).await? {
            Some(generation) if is_generation(&generation) => {
                Ok(tokio::fs::try_exists(paths.vectors(&generation)).await?)
            }
            _ => Ok(false),
        }
    }

    /// Sorted list of namespaces with a metadata record under the root
    pub async fn namespaces(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(namespace) = namespace_from_meta_file(name) {
                out.push(namespace.to_string());
            }
        }
        out.sort();
        Ok(out)
    }

    /// Delete blobs of `paths` other than `keep`: superseded generations and
    /// leftovers of saves that never committed. Runs under the exclusive lock.
    async fn remove_stale_blobs(&self, paths: &NamespacePaths, keep: &str) {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("Cannot list {} for cleanup: {err}", self.root.display());
                return;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let Some(generation) = name.to_str().and_then(|n| paths.generation_of(n)) else {
                continue;
            };
            if generation == keep {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => log::debug!("Removed stale vector blob {}", entry.path().display()),
                Err(err) => log::warn!(
                    "Failed to remove stale vector blob {}: {err}",
                    entry.path().display()
                ),
            }
        }
    }
}

/// Generation named by the committed metadata record, `None` when there is none
async fn committed_generation(paths: &NamespacePaths) -> Result<Option<String>> {
    let bytes = match tokio::fs::read(&paths.meta).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let record: CommittedGeneration = serde_json::from_slice(&bytes)?;
    Ok(Some(record.vectors_generation))
}

async fn read_namespace_file(path: &Path, namespace: &str) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(VectorStoreError::IndexNotFound(namespace.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Write to a sibling temp file, then rename over `path`
async fn write_replace(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn encode_vectors(vectors: &FlatIndex) -> Result<Vec<u8>> {
    let dim = header_field(vectors.dimension(), "dimension")?;
    let count = header_field(vectors.len(), "record count")?;
    let mut out = Vec::with_capacity(VECTOR_HEADER_LEN + vectors.len() * vectors.dimension() * 4);
    out.extend_from_slice(VECTOR_MAGIC);
    out.extend_from_slice(&dim.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    for v in vectors.values() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    Ok(out)
}

fn header_field(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        VectorStoreError::persistence(format!(
            "{what} {value} does not fit the DQV1 blob header"
        ))
    })
}

fn decode_vectors(bytes: &[u8]) -> Result<(usize, usize, Vec<f32>)> {
    if bytes.len() < VECTOR_HEADER_LEN || &bytes[0..4] != VECTOR_MAGIC {
        return Err(VectorStoreError::persistence("vector blob has no DQV1 header"));
    }
    let dim = read_u32(&bytes[4..8]) as usize;
    let count = read_u32(&bytes[8..12]) as usize;
    let expected_len = dim
        .checked_mul(count)
        .and_then(|n| n.checked_mul(4))
        .and_then(|n| n.checked_add(VECTOR_HEADER_LEN));
    if expected_len != Some(bytes.len()) {
        return Err(VectorStoreError::persistence(format!(
            "vector blob is {} bytes, header declares {count} x {dim}",
            bytes.len()
        )));
    }
    let values = bytes[VECTOR_HEADER_LEN..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((dim, count, values))
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
