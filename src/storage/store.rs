// Ordered key-value stores
//
// Provides the backends the keeper commits into:
// - MemStore: copy-on-write BTreeMap, also used as the immutable query snapshot
// - SledStore: persistent, crash-safe storage in a sled tree
//
// Every range read returns entries in ascending key order.

use crate::storage::cache::WriteBatch;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Name of the sled tree holding staking state
const STAKING_TREE: &str = "staking";

/// A key-value pair read from a store
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),

    #[error("Malformed key: {0}")]
    MalformedKey(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the store
    pub key_count: usize,
    /// Approximate disk size in bytes (0 for memory stores)
    pub disk_size_bytes: u64,
}

/// Smallest key greater than every key starting with `prefix`
///
/// Returns `None` when no such key exists (prefix is all 0xff).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Whether `[start, end)` contains no keys
pub(crate) fn is_empty_range(start: &[u8], end: Option<&[u8]>) -> bool {
    matches!(end, Some(end) if end <= start)
}

// ============================================================================
// STORE TRAITS
// ============================================================================

/// Read access to an ordered key-value store
pub trait KvStore {
    /// Get the value stored under `key`
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Entries with `start <= key < end` in ascending key order
    ///
    /// `end == None` reads to the end of the keyspace.
    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StoreError>;

    /// Check whether `key` is present
    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// All entries whose key starts with `prefix`, ascending
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KvPair>, StoreError> {
        let end = prefix_end(prefix);
        self.range(prefix, end.as_deref())
    }
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StoreError> {
        (**self).range(start, end)
    }
}

/// A store the keeper commits write batches into
pub trait CommitStore: KvStore {
    /// Apply all writes in `batch` atomically
    fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Point-in-time copy of the committed state
    fn snapshot(&self) -> Result<MemStore, StoreError>;
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory ordered store
///
/// Cloning is O(1); writes after a clone copy the map, so a clone is a stable
/// snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemStore {
    entries: Arc<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            key_count: self.entries.len(),
            disk_size_bytes: 0,
        }
    }

    /// Iterate all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<u8>)> {
        self.entries.iter()
    }
}

impl FromIterator<KvPair> for MemStore {
    fn from_iter<I: IntoIterator<Item = KvPair>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StoreError> {
        use std::ops::Bound;
        if is_empty_range(start, end) {
            return Ok(Vec::new());
        }
        let upper = match end {
            Some(end) => Bound::Excluded(end.to_vec()),
            None => Bound::Unbounded,
        };
        Ok(self
            .entries
            .range((Bound::Included(start.to_vec()), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl CommitStore for MemStore {
    fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let entries = Arc::make_mut(&mut self.entries);
        for (key, value) in batch.into_ops() {
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<MemStore, StoreError> {
        Ok(self.clone())
    }
}

// ============================================================================
// SLED STORE
// ============================================================================

/// Persistent key-value store for staking state
///
/// Uses sled for crash-safe, embedded storage.
/// Batches are applied atomically and are durable after flush.
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        let tree = db
            .open_tree(STAKING_TREE)
            .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db, tree })
    }

    /// Open a throwaway store that lives only in memory
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        let tree = db
            .open_tree(STAKING_TREE)
            .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db, tree })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.tree.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.tree.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StoreError> {
        if is_empty_range(start, end) {
            return Ok(Vec::new());
        }
        let iter = match end {
            Some(end) => self.tree.range(start.to_vec()..end.to_vec()),
            None => self.tree.range(start.to_vec()..),
        };
        let mut pairs = Vec::new();
        for result in iter {
            let (key, value) = result?;
            pairs.push((key.to_vec(), value.to_vec()));
        }
        Ok(pairs)
    }
}

impl CommitStore for SledStore {
    fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut sled_batch = sled::Batch::default();
        for (key, value) in batch.into_ops() {
            match value {
                Some(value) => sled_batch.insert(key, value),
                None => sled_batch.remove(key),
            }
        }
        self.tree.apply_batch(sled_batch)?;
        Ok(())
    }

    fn snapshot(&self) -> Result<MemStore, StoreError> {
        let mut pairs = Vec::new();
        for result in self.tree.iter() {
            let (key, value) = result?;
            pairs.push((key.to_vec(), value.to_vec()));
        }
        Ok(pairs.into_iter().collect())
    }
}
