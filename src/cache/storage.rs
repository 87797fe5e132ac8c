//! Storage backends for the memo cache.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::key::CacheKey;
use crate::error::{Error, Result};

/// A stored value and when it was written.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// Serialized (JSON) result
  pub data: Vec<u8>,
  pub cached_at: DateTime<Utc>,
}

/// Where memoized results are kept, keyed by `CacheKey::cache_hash`.
pub trait CacheStorage: Send + Sync {
  fn get(&self, key: &CacheKey) -> Result<Option<CachedEntry>>;

  fn set(&self, key: &CacheKey, data: &[u8]) -> Result<()>;

  /// Remove every entry.
  fn clear(&self) -> Result<()>;
}

// Lets callers pick the backend at runtime (`--no-cache`)
impl<S: CacheStorage + ?Sized> CacheStorage for Box<S> {
  fn get(&self, key: &CacheKey) -> Result<Option<CachedEntry>> {
    (**self).get(key)
  }

  fn set(&self, key: &CacheKey, data: &[u8]) -> Result<()> {
    (**self).set(key, data)
  }

  fn clear(&self) -> Result<()> {
    (**self).clear()
  }
}

/// Backend for `--no-cache`: every lookup misses and nothing is kept.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &CacheKey) -> Result<Option<CachedEntry>> {
    Ok(None)
  }

  fn set(&self, _key: &CacheKey, _data: &[u8]) -> Result<()> {
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    Ok(())
  }
}

/// SQLite-based cache storage, one `cache.db` file per cache directory.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the cache inside `dir`.
  pub fn open(dir: &Path) -> Result<Self> {
    std::fs::create_dir_all(dir)
      .map_err(|e| Error::cache(format!("Failed to create cache directory: {}", e)))?;

    let path = dir.join("cache.db");
    let conn = Connection::open(&path).map_err(|e| {
      Error::cache(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Default cache directory when none is configured.
  pub fn default_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
      .ok_or_else(|| Error::cache("Could not determine cache directory"))?;

    Ok(cache_dir.join("timesync"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| Error::cache(format!("Failed to run cache migrations: {}", e)))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| Error::cache(format!("Lock poisoned: {}", e)))
  }
}

const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS memo_cache (
    key_hash TEXT PRIMARY KEY,
    operation TEXT NOT NULL,
    description TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_memo_cache_operation ON memo_cache(operation);
"#;

impl CacheStorage for SqliteStorage {
  fn get(&self, key: &CacheKey) -> Result<Option<CachedEntry>> {
    let conn = self.lock()?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT data, cached_at FROM memo_cache WHERE key_hash = ?",
        params![key.cache_hash()],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| Error::cache(format!("Failed to read cache entry: {}", e)))?;

    match row {
      Some((data, cached_at)) => Ok(Some(CachedEntry {
        data,
        cached_at: parse_datetime(&cached_at)?,
      })),
      None => Ok(None),
    }
  }

  fn set(&self, key: &CacheKey, data: &[u8]) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO memo_cache (key_hash, operation, description, data, cached_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![key.cache_hash(), key.operation(), key.description(), data],
      )
      .map_err(|e| Error::cache(format!("Failed to store cache entry: {}", e)))?;

    Ok(())
  }

  fn clear(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM memo_cache", [])
      .map_err(|e| Error::cache(format!("Failed to clear cache: {}", e)))?;

    Ok(())
  }
}

/// In-process storage for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl MemoryStorage {
  pub fn len(&self) -> usize {
    self.entries.lock().map(|e| e.len()).unwrap_or_default()
  }
}

#[cfg(test)]
impl CacheStorage for MemoryStorage {
  fn get(&self, key: &CacheKey) -> Result<Option<CachedEntry>> {
    let entries = self.entries.lock().map_err(|e| Error::cache(e.to_string()))?;
    Ok(entries.get(&key.cache_hash()).map(|data| CachedEntry {
      data: data.clone(),
      cached_at: Utc::now(),
    }))
  }

  fn set(&self, key: &CacheKey, data: &[u8]) -> Result<()> {
    let mut entries = self.entries.lock().map_err(|e| Error::cache(e.to_string()))?;
    entries.insert(key.cache_hash(), data.to_vec());
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    let mut entries = self.entries.lock().map_err(|e| Error::cache(e.to_string()))?;
    entries.clear();
    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| Error::cache(format!("Failed to parse datetime '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sqlite_roundtrip_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::open(dir.path()).unwrap();
    let key = CacheKey::new("get_task").arg("abc123");

    assert!(storage.get(&key).unwrap().is_none());

    storage.set(&key, br#"{"id":"abc123"}"#).unwrap();
    let entry = storage.get(&key).unwrap().unwrap();
    assert_eq!(entry.data, br#"{"id":"abc123"}"#.to_vec());
    // Written in UTC by SQLite
    let age = Utc::now() - entry.cached_at;
    assert!(age.num_seconds() >= -1 && age.num_seconds() < 60);

    storage.clear().unwrap();
    assert!(storage.get(&key).unwrap().is_none());
  }

  #[test]
  fn test_sqlite_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let key = CacheKey::new("list_folders");

    {
      let storage = SqliteStorage::open(dir.path()).unwrap();
      storage.set(&key, b"[]").unwrap();
    }

    let storage = SqliteStorage::open(dir.path()).unwrap();
    assert_eq!(storage.get(&key).unwrap().unwrap().data, b"[]".to_vec());
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let key = CacheKey::new("anything");
    NoopStorage.set(&key, b"1").unwrap();
    assert!(NoopStorage.get(&key).unwrap().is_none());
  }
}
