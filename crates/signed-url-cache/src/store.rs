//! Persistent key-value tier
//!
//! The cache only needs string get/set/remove plus key enumeration for
//! sweeping, so any durable store can back it. Two stores ship here: one
//! file per key under a directory, and an in-process map for tests and for
//! running without a cache directory.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::Result;

/// Longest file name most filesystems accept, in bytes
const MAX_FILE_NAME_LEN: usize = 255;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Stores each key as a file named by its percent-encoded key
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Ensure the backing directory exists
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        info!(dir = ?self.dir, "File store initialized");
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let name = urlencoding::encode(key);
        if name.is_empty() || name == "." || name == ".." {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid store key: {key:?}"),
            )
            .into());
        }
        if name.len() > MAX_FILE_NAME_LEN {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("store key too long: {} bytes encoded", name.len()),
            )
            .into());
        }
        Ok(self.dir.join(&*name))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 contents are handed back as garbage for the caller to discard
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key)?, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if let Ok(key) = urlencoding::decode(&name) {
                keys.push(key.into_owned());
            }
        }
        Ok(keys)
    }
}

/// In-process store
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_set_get_remove() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("kv"));
        store.init().await.unwrap();

        assert_eq!(store.get("img_cache_a.jpg").await.unwrap(), None);

        store.set("img_cache_a.jpg", "value-1").await.unwrap();
        assert_eq!(
            store.get("img_cache_a.jpg").await.unwrap().as_deref(),
            Some("value-1")
        );

        store.set("img_cache_a.jpg", "value-2").await.unwrap();
        assert_eq!(
            store.get("img_cache_a.jpg").await.unwrap().as_deref(),
            Some("value-2")
        );

        store.remove("img_cache_a.jpg").await.unwrap();
        assert_eq!(store.get("img_cache_a.jpg").await.unwrap(), None);

        // Removing a missing key is fine
        store.remove("img_cache_a.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_keys_round_trip_nested_paths() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        store.init().await.unwrap();

        store.set("img_cache_user-1/whiskey.jpg", "a").await.unwrap();
        store.set("img_cache_gin tonic.png", "b").await.unwrap();
        store.set("theme", "dark").await.unwrap();

        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "img_cache_gin tonic.png".to_string(),
                "img_cache_user-1/whiskey.jpg".to_string(),
                "theme".to_string(),
            ]
        );
        assert_eq!(
            store.get("img_cache_user-1/whiskey.jpg").await.unwrap().as_deref(),
            Some("a")
        );
    }

    #[tokio::test]
    async fn test_file_store_missing_dir_has_no_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never-created"));
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_rejects_dot_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        assert!(store.set("..", "x").await.is_err());
        assert!(store.set("", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_rejects_overlong_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        store.init().await.unwrap();

        // Each space encodes to three bytes
        let long = format!("img_cache_{}", " ".repeat(100));
        let err = store.set(&long, "x").await.unwrap_err();
        assert!(err.to_string().contains("too long"));
        assert!(store.get(&long).await.is_err());
        assert!(store.keys().await.unwrap().is_empty());

        // Right at the limit is still accepted
        let fits = "k".repeat(MAX_FILE_NAME_LEN);
        store.set(&fits, "v").await.unwrap();
        assert_eq!(store.get(&fits).await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.keys().await.unwrap(), vec!["k".to_string()]);

        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.keys().await.unwrap().is_empty());
    }
}
