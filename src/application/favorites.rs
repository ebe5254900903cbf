//! The shopper's favorites list.
//!
//! One [`FavoritesStore`] exists per client session and is shared by `Arc`.
//! State lives in memory and is written through to a single local-storage
//! entry on every mutation. Views observe changes through
//! [`FavoritesStore::subscribe`] rather than re-reading storage.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

use crate::cache::{rw_read, rw_write};

/// Local-storage entry holding the JSON array of favorited product ids.
pub const FAVORITES_STORAGE_KEY: &str = "vastra.favorites";

const SOURCE: &str = "application::favorites";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value storage that survives between sessions.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        rw_write(&storage.entries, SOURCE, "memory.seed").insert(key.into(), value.into());
        storage
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(rw_read(&self.entries, SOURCE, "memory.get").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        rw_write(&self.entries, SOURCE, "memory.set").insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        rw_write(&self.entries, SOURCE, "memory.remove").remove(key);
        Ok(())
    }
}

/// Favorites as published to subscribers after each mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FavoritesSnapshot {
    /// Product ids in the order they were favorited.
    pub ids: Vec<String>,
    /// Increments on every mutation.
    pub revision: u64,
}

impl FavoritesSnapshot {
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|candidate| candidate == id)
    }
}

pub type FavoritesSubscription = watch::Receiver<FavoritesSnapshot>;

#[derive(Debug, Default)]
struct FavoriteSet {
    ordered: Vec<String>,
    members: HashSet<String>,
    revision: u64,
}

impl FavoriteSet {
    fn from_ids(ids: Vec<String>) -> Self {
        let mut set = Self::default();
        for id in ids {
            if set.members.insert(id.clone()) {
                set.ordered.push(id);
            }
        }
        set
    }

    fn snapshot(&self) -> FavoritesSnapshot {
        FavoritesSnapshot {
            ids: self.ordered.clone(),
            revision: self.revision,
        }
    }
}

pub struct FavoritesStore {
    storage: Arc<dyn LocalStorage>,
    state: RwLock<FavoriteSet>,
    publisher: watch::Sender<FavoritesSnapshot>,
}

impl FavoritesStore {
    /// Load persisted favorites once. Missing or unreadable data starts an
    /// empty list; problems are logged, never returned.
    pub fn initialize(storage: Arc<dyn LocalStorage>) -> Self {
        let set = FavoriteSet::from_ids(load_persisted(storage.as_ref()));
        let (publisher, _) = watch::channel(set.snapshot());

        Self {
            storage,
            state: RwLock::new(set),
            publisher,
        }
    }

    /// Flip membership of `id` and return whether it is now a favorite.
    pub fn toggle(&self, id: &str) -> bool {
        let mut state = rw_write(&self.state, SOURCE, "toggle");

        let now_favorite = if state.members.remove(id) {
            state.ordered.retain(|candidate| candidate != id);
            false
        } else {
            state.members.insert(id.to_string());
            state.ordered.push(id.to_string());
            true
        };
        state.revision += 1;

        self.persist(&state.ordered, "toggle");
        self.publisher.send_replace(state.snapshot());
        now_favorite
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        rw_read(&self.state, SOURCE, "is_favorite")
            .members
            .contains(id)
    }

    pub fn count(&self) -> usize {
        rw_read(&self.state, SOURCE, "count").members.len()
    }

    pub fn ids(&self) -> Vec<String> {
        rw_read(&self.state, SOURCE, "ids").ordered.clone()
    }

    pub fn snapshot(&self) -> FavoritesSnapshot {
        rw_read(&self.state, SOURCE, "snapshot").snapshot()
    }

    /// Empty the list and drop the persisted entry.
    pub fn clear(&self) {
        let mut state = rw_write(&self.state, SOURCE, "clear");
        state.ordered.clear();
        state.members.clear();
        state.revision += 1;

        if let Err(err) = self.storage.remove(FAVORITES_STORAGE_KEY) {
            warn!(
                target = SOURCE,
                op = "clear",
                key = FAVORITES_STORAGE_KEY,
                error = %err,
                result = "memory_only",
                "failed to remove persisted favorites"
            );
        }
        self.publisher.send_replace(state.snapshot());
    }

    /// Receive every subsequent change; the current value is available
    /// immediately through `borrow()`.
    pub fn subscribe(&self) -> FavoritesSubscription {
        self.publisher.subscribe()
    }

    fn persist(&self, ids: &[String], op: &'static str) {
        let outcome = serde_json::to_string(ids)
            .map_err(StorageError::from)
            .and_then(|payload| self.storage.set(FAVORITES_STORAGE_KEY, &payload));

        if let Err(err) = outcome {
            warn!(
                target = SOURCE,
                op,
                key = FAVORITES_STORAGE_KEY,
                error = %err,
                result = "memory_only",
                "failed to persist favorites"
            );
        }
    }
}

fn load_persisted(storage: &dyn LocalStorage) -> Vec<String> {
    let raw = match storage.get(FAVORITES_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "initialize",
                key = FAVORITES_STORAGE_KEY,
                error = %err,
                result = "empty",
                "failed to read persisted favorites"
            );
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => ids,
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "initialize",
                key = FAVORITES_STORAGE_KEY,
                error = %err,
                result = "empty",
                "persisted favorites are malformed"
            );
            Vec::new()
        }
    }
}
