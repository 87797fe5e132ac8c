//! Disk-backed memoization of remote reads.
//!
//! Results are keyed by operation name plus arguments and kept until the
//! cache is explicitly cleared. Only successful results are stored.
//! The storage is single-writer: sharing one cache directory between
//! concurrent processes is not supported.

mod key;
mod layer;
mod storage;

pub use key::{CacheKey, CacheSource};
pub use layer::CacheLayer;
#[cfg(test)]
pub use storage::MemoryStorage;
pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
