//! Cache keys and lookup results.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Identity of a memoized call: operation name, positional arguments and
/// keyword arguments.
///
/// Keyword arguments live in a `BTreeMap`, so the order they were supplied
/// in never changes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
  operation: String,
  args: Vec<Value>,
  kwargs: BTreeMap<String, Value>,
}

impl CacheKey {
  pub fn new(operation: impl Into<String>) -> Self {
    Self {
      operation: operation.into(),
      args: Vec::new(),
      kwargs: BTreeMap::new(),
    }
  }

  /// Append a positional argument.
  pub fn arg(mut self, value: impl Into<Value>) -> Self {
    self.args.push(value.into());
    self
  }

  /// Add a keyword argument.
  pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.kwargs.insert(name.into(), value.into());
    self
  }

  pub fn operation(&self) -> &str {
    &self.operation
  }

  /// Stable, fixed-length hash used as the storage key.
  pub fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }

  /// Human-readable form stored next to the entry.
  pub fn description(&self) -> String {
    self.canonical()
  }

  // serde_json renders maps in key order, so BTreeMap output is deterministic
  fn canonical(&self) -> String {
    let args = Value::Array(self.args.clone()).to_string();
    let kwargs = serde_json::to_string(&self.kwargs).unwrap_or_default();
    format!("{}:{}:{}", self.operation, args, kwargs)
  }
}

/// Result from a cache lookup, including where the data came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Computed by calling the remote service
  Network,
  /// Served from storage without a remote call
  Cache,
}
