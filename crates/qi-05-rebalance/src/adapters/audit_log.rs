use super::lock::{lock_path_for, FileLock};
use crate::domain::{AuditEntry, StoreError};
use crate::ports::outbound::AuditLog;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append-only audit log, one JSON object per line.
///
/// A call's entries are written with a single `write_all` under the file
/// lock and synced before returning.
#[derive(Debug)]
pub struct JsonLinesAuditLog {
    path: PathBuf,
    lock_path: PathBuf,
    local: Mutex<()>,
}

impl JsonLinesAuditLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            lock_path: lock_path_for(&path),
            path,
            local: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry written so far, in order.
    pub fn read_entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        let _local = self.local.lock();
        let _lock = FileLock::acquire(&self.lock_path)?;
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| StoreError::Corrupt {
                key: format!("{}:{}", self.path.display(), number + 1),
                reason: e.to_string(),
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl AuditLog for JsonLinesAuditLog {
    fn append(&self, entries: &[AuditEntry]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut buffer = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buffer, entry).map_err(|e| StoreError::Encode {
                key: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
            buffer.push(b'\n');
        }

        let _local = self.local.lock();
        let _lock = FileLock::acquire(&self.lock_path)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&buffer)?;
        file.sync_data()?;
        Ok(())
    }
}
