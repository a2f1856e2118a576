//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

/// A request that can be addressed in the cache.
///
/// Two requests that are semantically equal must produce the same
/// `cache_hash`, regardless of incidental ordering in their parameters.
pub trait QueryKey {
  /// Stable, fixed-length digest of the request (hex encoded).
  fn cache_hash(&self) -> String;

  /// File stem the entry is stored under. Must embed `cache_hash`.
  fn file_stem(&self) -> String;

  /// Human readable form used in logs and error context.
  fn description(&self) -> String;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the entry was written (if served from cache and the filesystem knows)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from a live call.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from a stored entry.
  pub fn from_cache(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at,
    }
  }

  pub fn is_cached(&self) -> bool {
    self.source == CacheSource::Cache
  }
}

/// Indicates where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from a live call
  Network,
  /// Replayed from a stored entry
  Cache,
}
