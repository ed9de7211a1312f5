use crate::error::{Result, VectorStoreError};
use fs2::FileExt;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockMode {
    /// Held by `save`
    Exclusive,
    /// Held by `load`
    Shared,
}

/// Advisory per-namespace lock, released on drop
pub(crate) struct NamespaceLock {
    file: std::fs::File,
}

impl Drop for NamespaceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

pub(crate) async fn acquire_namespace_lock(path: &Path, mode: LockMode) -> Result<NamespaceLock> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let path: PathBuf = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<NamespaceLock> {
        use std::fs::OpenOptions;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                VectorStoreError::persistence(format!("open lock {}: {err}", path.display()))
            })?;

        let start = Instant::now();
        let locked = match mode {
            LockMode::Exclusive => file.lock_exclusive(),
            LockMode::Shared => file.lock_shared(),
        };
        locked.map_err(|err| {
            VectorStoreError::persistence(format!("acquire lock {}: {err}", path.display()))
        })?;

        let waited = start.elapsed().as_millis();
        if waited > 0 {
            log::debug!("Waited {waited} ms for {mode:?} lock on {}", path.display());
        }
        Ok(NamespaceLock { file })
    })
    .await
    .map_err(|err| VectorStoreError::persistence(format!("join lock task: {err}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn shared_locks_coexist() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ns.lock");
        let a = acquire_namespace_lock(&path, LockMode::Shared).await.unwrap();
        let b = acquire_namespace_lock(&path, LockMode::Shared).await.unwrap();
        drop((a, b));
    }

    #[tokio::test]
    async fn exclusive_waits_for_release() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ns.lock");
        let held = acquire_namespace_lock(&path, LockMode::Exclusive)
            .await
            .unwrap();

        let contender = tokio::spawn({
            let path = path.clone();
            async move { acquire_namespace_lock(&path, LockMode::Shared).await }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!contender.is_finished(), "shared lock must wait for writer");

        drop(held);
        let lock = tokio::time::timeout(Duration::from_secs(5), contender)
            .await
            .expect("reader acquired lock")
            .unwrap();
        assert!(lock.is_ok());
    }
}
