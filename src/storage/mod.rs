// Storage module - PERSISTENCE
// Ordered key-value backends, the per-operation write cache, key layout and
// record codec

mod cache;
pub mod codec;
pub mod keys;
mod store;

pub use cache::{CacheStore, WriteBatch};
pub use store::{
    prefix_end, CommitStore, KvPair, KvStore, MemStore, SledStore, StorageStats, StoreError,
};
