//! Cache layer that memoizes remote reads on top of a storage backend.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::key::{CacheKey, CacheResult};
use super::storage::CacheStorage;
use crate::error::Result;

/// Memoizes expensive remote calls.
///
/// 1. Look the key up in storage - on a hit, return the stored value
/// 2. On a miss, run the compute future
/// 3. Store the result only if the computation succeeded
///
/// Entries never expire; they are dropped only by [`CacheLayer::clear`].
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
}

impl<S: CacheStorage> CacheLayer<S> {
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Return the memoized result for `key`, computing it on a miss.
  pub async fn fetch_or_compute<T, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<T>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    Ok(self.fetch(key, compute).await?.data)
  }

  /// Like `fetch_or_compute`, but also reports whether the value came from storage.
  pub async fn fetch<T, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<CacheResult<T>>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    if let Some(cached) = self.storage.get(key)? {
      match serde_json::from_slice::<T>(&cached.data) {
        Ok(data) => {
          debug!(
            operation = key.operation(),
            cached_at = %cached.cached_at,
            "cache hit"
          );
          return Ok(CacheResult::from_cache(data));
        }
        // Shape changed since it was written; recompute and overwrite
        Err(e) => warn!(operation = key.operation(), error = %e, "discarding unreadable cache entry"),
      }
    }

    debug!(operation = key.operation(), "cache miss");
    let data = compute().await?;
    let bytes = serde_json::to_vec(&data)?;
    self.storage.set(key, &bytes)?;

    Ok(CacheResult::from_network(data))
  }

  /// Drop every cached entry.
  pub fn clear(&self) -> Result<()> {
    self.storage.clear()
  }

  #[cfg(test)]
  pub fn storage(&self) -> &S {
    &self.storage
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}
