use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use {async_trait::async_trait, tokio::sync::RwLock, tracing::debug};

use crate::{Error, Result};

/// Key-value store holding per-user prompt modes (`ai:mode:<user>` → mode).
#[async_trait]
pub trait ModeStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryModeStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryModeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModeStore for MemoryModeStore {
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
}

/// Store persisted as a single JSON object on disk.
///
/// The whole map is kept in memory; every `set` rewrites the file through a
/// temporary sibling and a rename, under the write lock.
#[derive(Debug)]
pub struct JsonFileModeStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileModeStore {
    /// Open the store, starting empty when the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(Error::external(
                    format!("failed to read {}", path.display()),
                    e,
                ));
            },
        };
        debug!(path = %path.display(), entries = entries.len(), "opened mode store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ModeStore for JsonFileModeStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let previous = entries.insert(key.to_string(), value.to_string());

        let body = serde_json::to_string_pretty(&*entries)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let written = async {
            tokio::fs::write(&tmp, body).await?;
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            // Keep memory and disk consistent.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(Error::external(
                format!("failed to write {}", self.path.display()),
                e,
            ));
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_get_set() {
        let store = MemoryModeStore::new();
        assert_eq!(store.get("ai:mode:steve").await.unwrap(), None);
        store.set("ai:mode:steve", "pirate").await.unwrap();
        assert_eq!(
            store.get("ai:mode:steve").await.unwrap().as_deref(),
            Some("pirate")
        );
    }

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modes").join("modes.json");

        let store = JsonFileModeStore::open(&path).await.unwrap();
        store.set("ai:mode:steve", "pirate").await.unwrap();
        store.set("ai:mode:alex", "default").await.unwrap();
        drop(store);

        let reopened = JsonFileModeStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("ai:mode:steve").await.unwrap().as_deref(),
            Some("pirate")
        );
        assert_eq!(reopened.path(), path.as_path());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modes.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileModeStore::open(&path).await,
            Err(Error::SerdeJson(_))
        ));
    }
}
