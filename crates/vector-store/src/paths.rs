use crate::error::{Result, VectorStoreError};
use std::path::{Path, PathBuf};

pub const DEFAULT_INDEX_DIR_NAME: &str = "vector_indexes";

pub const VECTOR_BLOB_EXT: &str = "index";
pub const META_RECORD_SUFFIX: &str = ".meta.json";
pub const LOCK_EXT: &str = "lock";

/// Hex digits of the blob checksum that name one vector generation
pub const GENERATION_LEN: usize = 16;

const MAX_NAMESPACE_LEN: usize = 200;

/// Namespace keys become file names, so they must stay inside the store root
pub fn validate_namespace(namespace: &str) -> Result<()> {
    let valid = !namespace.is_empty()
        && namespace.len() <= MAX_NAMESPACE_LEN
        && !namespace.starts_with('.')
        && namespace
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(VectorStoreError::InvalidNamespace(namespace.to_string()))
    }
}

/// Whether `generation` is a well-formed generation tag
#[must_use]
pub fn is_generation(generation: &str) -> bool {
    generation.len() == GENERATION_LEN
        && generation
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// File locations of one namespace under a store root.
///
/// Vector blobs are named per generation (`N.<generation>.index`); the
/// metadata record names the generation it belongs to, so replacing the
/// record is the only step that changes what a loader sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePaths {
    root: PathBuf,
    namespace: String,
    pub meta: PathBuf,
    pub lock: PathBuf,
}

impl NamespacePaths {
    pub fn new(root: &Path, namespace: &str) -> Result<Self> {
        validate_namespace(namespace)?;
        Ok(Self {
            root: root.to_path_buf(),
            namespace: namespace.to_string(),
            meta: root.join(format!("{namespace}{META_RECORD_SUFFIX}")),
            lock: root.join(format!("{namespace}.{LOCK_EXT}")),
        })
    }

    /// Vector blob of one generation
    #[must_use]
    pub fn vectors(&self, generation: &str) -> PathBuf {
        self.root
            .join(format!("{}.{generation}.{VECTOR_BLOB_EXT}", self.namespace))
    }

    /// Generation encoded in a vector blob file name of this namespace, if any
    #[must_use]
    pub fn generation_of<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let generation = file_name
            .strip_prefix(self.namespace.as_str())?
            .strip_prefix('.')?
            .strip_suffix(VECTOR_BLOB_EXT)?
            .strip_suffix('.')?;
        is_generation(generation).then_some(generation)
    }
}

/// Namespace encoded in a metadata record file name, if any
#[must_use]
pub fn namespace_from_meta_file(name: &str) -> Option<&str> {
    let namespace = name.strip_suffix(META_RECORD_SUFFIX)?;
    validate_namespace(namespace).ok()?;
    Some(namespace)
}
