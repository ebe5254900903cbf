//! File-backed local storage for command-line sessions.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::application::favorites::{LocalStorage, MemoryStorage, StorageError};
use crate::cache::{rw_read, rw_write};

const SOURCE: &str = "infra::local_store";

/// Keeps every entry in one JSON object file, rewritten atomically on each
/// change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file. A missing file starts empty; an unreadable one
    /// is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(
                        target = SOURCE,
                        op = "open",
                        path = %path.display(),
                        error = %err,
                        result = "reset",
                        "local storage file is corrupted"
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(StorageError::Io(err)),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory)?;

        let mut file = NamedTempFile::new_in(&directory)?;
        serde_json::to_writer_pretty(&mut file, entries)?;
        file.write_all(b"\n")?;
        file.persist(&self.path)
            .map_err(|err| StorageError::Io(err.error))?;
        Ok(())
    }
}

/// Open file storage at `path`, or fall back to in-memory storage when the
/// file cannot be read. Favorites then last for the session only.
pub fn open_or_memory(path: impl Into<PathBuf>) -> Arc<dyn LocalStorage> {
    let path = path.into();
    match FileStorage::open(&path) {
        Ok(storage) => Arc::new(storage),
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "open",
                path = %path.display(),
                error = %err,
                result = "memory_only",
                "local storage unavailable"
            );
            Arc::new(MemoryStorage::new())
        }
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(rw_read(&self.entries, SOURCE, "get").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = rw_write(&self.entries, SOURCE, "set");
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = rw_write(&self.entries, SOURCE, "remove");
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
