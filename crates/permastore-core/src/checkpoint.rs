use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Keyed store for upload progress checkpoints.
///
/// Contract: `save` replaces atomically (a crash mid-save never leaves a
/// half-written checkpoint observable to `load`); `load` after a successful
/// `save` returns exactly the saved bytes; `delete` is idempotent.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist checkpoint bytes under a key, replacing any previous value.
    async fn save(&self, key: &str, data: &[u8]) -> anyhow::Result<()>;

    /// Load checkpoint bytes, `None` if the key has never been saved
    /// or was deleted.
    async fn load(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;

    /// Delete a checkpoint. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Filesystem-backed checkpoint store.
///
/// Keys are hashed to hex filenames so arbitrary caller keys can neither
/// collide nor escape the directory. Writes go through a temp file in the
/// same directory followed by a rename.
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        let path = self.key_path(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)?;
        tracing::debug!("checkpoint saved: {}", path.display());
        Ok(())
    }

    async fn load(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(&path)?))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// In-memory checkpoint store for tests and embedding.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("checkpoint map poisoned"))?;
        entries.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn load(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("checkpoint map poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("checkpoint map poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn file_store_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(tmp.path()).unwrap();

        let key = "upload/job-1";
        let data = br#"{"chunk_index":2}"#;

        store.save(key, data).await.unwrap();
        let loaded = store.load(key).await.unwrap();
        assert_eq!(loaded.as_deref(), Some(data.as_slice()));

        store.delete(key).await.unwrap();
        assert!(store.load(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_save_replaces() {
        let tmp = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(tmp.path()).unwrap();

        store.save("k", b"first").await.unwrap();
        store.save("k", b"second").await.unwrap();
        assert_eq!(store.load("k").await.unwrap().unwrap(), b"second");
    }

    #[tokio::test]
    async fn file_store_delete_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(tmp.path()).unwrap();
        store.delete("never-saved").await.unwrap();
    }

    #[tokio::test]
    async fn file_store_keys_with_separators_are_safe() {
        let tmp = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(tmp.path()).unwrap();

        store.save("../escape/attempt", b"a").await.unwrap();
        store.save("plain", b"b").await.unwrap();

        // Both land inside the store directory, as hashed filenames.
        let count = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryCheckpointStore::new();
        assert!(store.load("k").await.unwrap().is_none());
        store.save("k", b"bytes").await.unwrap();
        assert_eq!(store.load("k").await.unwrap().unwrap(), b"bytes");
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.load("k").await.unwrap().is_none());
    }
}
