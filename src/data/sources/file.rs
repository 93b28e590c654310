//! Local JSON store.
//!
//! Each record is a file `<root>/<key>.json`. Writes use atomic rename
//! (write `.tmp`, then `rename()`) so a crash never leaves a half-written
//! record behind.

use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::data::fault::DataFault;
use crate::data::source::{DataSource, validate_key};

pub struct FileSource<T> {
    name: String,
    root: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> FileSource<T> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            name: format!("file:{}", root.display()),
            root,
            _record: PhantomData,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl<T: Serialize> FileSource<T> {
    /// Stores `record` under `key`, replacing any previous entry.
    pub async fn store(&self, key: &str, record: &T) -> Result<(), DataFault> {
        validate_key(key)?;
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| DataFault::StorageWrite(format!("encoding '{key}': {e}")))?;
        let path = self.path_for(key);
        atomic_write(&path, json.as_bytes())
            .await
            .map_err(|e| DataFault::StorageWrite(format!("{}: {}", path.display(), e)))?;
        debug!("Stored {} in {}", key, self.name);
        Ok(())
    }
}

async fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, contents).await?;
    tokio::fs::rename(&tmp_path, path).await
}

#[async_trait]
impl<T> DataSource for FileSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Request = String;
    type Response = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, key: &String) -> Result<T, DataFault> {
        validate_key(key)?;
        let path = self.path_for(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DataFault::StorageMissing(key.clone()));
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return Err(DataFault::StorageRead(format!("{}: {}", path.display(), e)));
            }
        };
        serde_json::from_str(&contents).map_err(|e| DataFault::Decode(e.to_string()))
    }
}

/// Reads from a primary source and keeps a local copy of every success.
///
/// A failed cache write is logged and otherwise ignored; the caller still
/// gets the primary's response.
pub struct WriteThrough<S, T> {
    primary: S,
    cache: FileSource<T>,
}

impl<S, T> WriteThrough<S, T> {
    pub fn new(primary: S, cache: FileSource<T>) -> Self {
        Self { primary, cache }
    }
}

#[async_trait]
impl<S, T> DataSource for WriteThrough<S, T>
where
    S: DataSource<Request = String, Response = T>,
    T: Serialize + Send + Sync + 'static,
{
    type Request = String;
    type Response = T;

    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn fetch(&self, key: &String) -> Result<T, DataFault> {
        let record = self.primary.fetch(key).await?;
        if let Err(e) = self.cache.store(key, &record).await {
            warn!("Cache write for '{}' failed: {}", key, e);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    fn note(id: &str) -> Note {
        Note {
            id: id.to_string(),
            body: format!("body of {id}"),
        }
    }

    #[tokio::test]
    async fn test_store_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::<Note>::new(dir.path());
        source.store("n1", &note("n1")).await.unwrap();
        assert_eq!(source.fetch(&"n1".to_string()).await, Ok(note("n1")));
        assert!(!dir.path().join("n1.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::<Note>::new(dir.path());
        assert_eq!(
            source.fetch(&"ghost".to_string()).await,
            Err(DataFault::StorageMissing("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_decode_fault() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let source = FileSource::<Note>::new(dir.path());
        let fault = source.fetch(&"bad".to_string()).await.unwrap_err();
        assert!(matches!(fault, DataFault::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_storage_read_fault() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where a file is expected cannot be read as a string.
        std::fs::create_dir(dir.path().join("folder.json")).unwrap();
        let source = FileSource::<Note>::new(dir.path());
        let fault = source.fetch(&"folder".to_string()).await.unwrap_err();
        assert!(matches!(fault, DataFault::StorageRead(_)));
    }

    #[tokio::test]
    async fn test_failed_store_is_storage_write_fault() {
        let dir = tempfile::tempdir().unwrap();
        // The root is a regular file, so nothing can be created beneath it.
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, "").unwrap();
        let source = FileSource::<Note>::new(&root);

        let fault = source.store("n1", &note("n1")).await.unwrap_err();
        assert!(matches!(fault, DataFault::StorageWrite(_)), "{fault:?}");
        assert!(fault.to_string().starts_with("storage write error"));
    }

    #[tokio::test]
    async fn test_write_through_populates_cache() {
        let primary_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let primary = FileSource::<Note>::new(primary_dir.path());
        primary.store("n2", &note("n2")).await.unwrap();

        let source = WriteThrough::new(primary, FileSource::<Note>::new(cache_dir.path()));
        assert_eq!(source.fetch(&"n2".to_string()).await, Ok(note("n2")));

        let cache = FileSource::<Note>::new(cache_dir.path());
        assert_eq!(cache.fetch(&"n2".to_string()).await, Ok(note("n2")));
    }
}
