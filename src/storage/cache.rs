// Write cache over a committed store
//
// Keeper operations write into a CacheStore. On success the cached writes
// become one WriteBatch applied atomically; on failure the cache is dropped
// and the committed store is untouched.

use crate::storage::store::{is_empty_range, KvPair, KvStore, StoreError};
use std::collections::BTreeMap;
use std::ops::Bound;

/// Ordered set of puts (`Some`) and deletes (`None`)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.insert(key, None);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consume the batch, yielding operations in key order
    pub fn into_ops(self) -> impl Iterator<Item = (Vec<u8>, Option<Vec<u8>>)> {
        self.ops.into_iter()
    }
}

/// Read-through, write-back cache layered on a parent store
pub struct CacheStore<'a, S: KvStore + ?Sized> {
    parent: &'a S,
    writes: WriteBatch,
}

impl<'a, S: KvStore + ?Sized> CacheStore<'a, S> {
    pub fn new(parent: &'a S) -> Self {
        Self {
            parent,
            writes: WriteBatch::new(),
        }
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.put(key, value);
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.delete(key);
    }

    /// Number of pending writes
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Hand the pending writes over for commit
    pub fn into_batch(self) -> WriteBatch {
        self.writes
    }
}

impl<S: KvStore + ?Sized> KvStore for CacheStore<'_, S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.ops.get(key) {
            Some(cached) => Ok(cached.clone()),
            None => self.parent.get(key),
        }
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StoreError> {
        if is_empty_range(start, end) {
            return Ok(Vec::new());
        }
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.range(start, end)?.into_iter().collect();

        let upper = match end {
            Some(end) => Bound::Excluded(end.to_vec()),
            None => Bound::Unbounded,
        };
        for (key, value) in self.writes.ops.range((Bound::Included(start.to_vec()), upper)) {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}
