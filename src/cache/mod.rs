// Cache module for the stats fetch layer.
// A TTL envelope cache drives an external key-value store, with a disk fallback.

pub mod disk;
pub mod expiring;
pub mod store;

pub use disk::DiskStore;
pub use expiring::ExpiringCache;
pub use store::{KeyValueStore, MemoryStore, StoredEntry};
