use super::lock::{lock_path_for, FileLock};
use crate::domain::StoreError;
use crate::ports::outbound::{StateStore, UpdateFn};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type Document = BTreeMap<String, Value>;

/// File-backed state store.
///
/// All keys live in one pretty-printed JSON document. Every operation takes
/// the sidecar file lock, re-reads the document, and, if it changed
/// anything, writes a temp file and renames it over the original, so readers
/// never see a torn write and concurrent processes never lose an update.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    lock_path: PathBuf,
    /// Serializes threads of this process before they contend on the file lock
    local: Mutex<()>,
}

impl FileStateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        match std::fs::metadata(&path) {
            Ok(metadata) => info!(
                path = %path.display(),
                bytes = metadata.len(),
                "Found existing state file"
            ),
            Err(_) => info!(path = %path.display(), "No existing state file"),
        }
        Self {
            lock_path: lock_path_for(&path),
            path,
            local: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn save(&self, document: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(document).map_err(|e| StoreError::Encode {
            key: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), keys = document.len(), "State file written");
        Ok(())
    }

    /// Run `f` on the document under both locks; persist if it returns true.
    fn with_document<T>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let _local = self.local.lock();
        let _lock = FileLock::acquire(&self.lock_path)?;
        let mut document = self.load()?;
        let (out, dirty) = f(&mut document)?;
        if dirty {
            self.save(&document)?;
        }
        Ok(out)
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.with_document(|document| Ok((document.get(key).cloned(), false)))
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.with_document(|document| {
            document.insert(key.to_string(), value);
            Ok(((), true))
        })
    }

    fn put_batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.with_document(|document| {
            document.extend(entries);
            Ok(((), true))
        })
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<Value, StoreError> {
        self.with_document(|document| {
            let next = f(document.get(key).cloned())?;
            document.insert(key.to_string(), next.clone());
            Ok((next, true))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_put_get_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path);
        assert_eq!(store.get("missing").unwrap(), None);
        store.put("weights/latest", json!({"epoch_id": 4})).unwrap();
        drop(store);

        let reopened = FileStateStore::new(&path);
        assert_eq!(
            reopened.get("weights/latest").unwrap(),
            Some(json!({"epoch_id": 4}))
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_batch_is_written_together() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        store
            .put_batch(vec![
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!(2)),
            ])
            .unwrap();
        assert_eq!(store.get("a").unwrap(), Some(json!(1)));
        assert_eq!(store.get("b").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_two_handles_share_updates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let first = FileStateStore::new(&path);
        let second = FileStateStore::new(&path);

        first.put("k", json!("one")).unwrap();
        assert_eq!(second.get("k").unwrap(), Some(json!("one")));
        second.put("k", json!("two")).unwrap();
        assert_eq!(first.get("k").unwrap(), Some(json!("two")));
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let handles: Vec<_> = (0..4)
            .map(|_| Arc::new(FileStateStore::new(&path)))
            .collect();

        let threads: Vec<_> = handles
            .iter()
            .cloned()
            .map(|store| {
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store
                            .update("counter", &mut |current| {
                                let n = current.and_then(|v| v.as_u64()).unwrap_or(0);
                                Ok(json!(n + 1))
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(handles[0].get("counter").unwrap(), Some(json!(100)));
    }

    #[test]
    fn test_corrupt_file_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = FileStateStore::new(&path);
        assert!(matches!(store.get("k"), Err(StoreError::Corrupt { .. })));
    }
}
