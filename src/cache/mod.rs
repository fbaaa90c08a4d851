//! Bounded TTL cache for resolved content
//!
//! Provides in-memory caching with per-entry expiry, a hard capacity bound
//! with least-recently-used eviction, and a periodic background sweep.

mod memory;

pub use memory::{Cache, CacheConfig, CacheStats};
