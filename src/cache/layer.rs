//! Cache layer that orchestrates caching logic with live fetching.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use super::storage::{CacheStorage, StorageError};
use super::traits::{CacheResult, QueryKey};

type InFlightMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Failure of a cached fetch: either the fetcher failed or the entry could not be stored.
#[derive(Debug)]
pub enum LayerError<E> {
  Fetch(E),
  Write {
    request: String,
    source: StorageError,
  },
}

/// Cache layer that sits between collectors and the live client.
///
/// Entries never expire. In cached mode a stored entry is replayed; in uncached
/// mode the fetcher always runs and its result overwrites the entry.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  in_flight: InFlightMap,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      in_flight: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  #[cfg(test)]
  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Fetch a response, replaying the stored entry when `use_cache` allows it.
  ///
  /// 1. In cached mode, return a readable stored entry immediately
  /// 2. Otherwise wait for any in-flight fetch of the same key
  /// 3. In cached mode, re-check storage (the previous holder may have just written it)
  /// 4. Run the fetcher, persist the result, return it
  pub async fn fetch<Q, F, Fut, E>(
    &self,
    key: &Q,
    use_cache: bool,
    fetcher: F,
  ) -> Result<CacheResult<Value>, LayerError<E>>
  where
    Q: QueryKey + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, E>>,
  {
    let stem = key.file_stem();

    if use_cache {
      if let Some(hit) = self.lookup(&stem) {
        return Ok(hit);
      }
    }

    let _in_flight = self.acquire(&stem).await;

    if use_cache {
      if let Some(hit) = self.lookup(&stem) {
        return Ok(hit);
      }
    }

    debug!(key = %stem, use_cache, "cache miss, fetching");
    let data = fetcher().await.map_err(LayerError::Fetch)?;

    self
      .storage
      .write(&stem, &data)
      .map_err(|source| LayerError::Write {
        request: key.description(),
        source,
      })?;

    Ok(CacheResult::from_network(data))
  }

  /// Read a stored entry. Unreadable entries are logged and treated as misses.
  fn lookup(&self, stem: &str) -> Option<CacheResult<Value>> {
    match self.storage.read(stem) {
      Ok(Some(entry)) => {
        debug!(key = %stem, cached_at = ?entry.cached_at, "cache hit");
        Some(CacheResult::from_cache(entry.response, entry.cached_at))
      }
      Ok(None) => None,
      Err(e) => {
        warn!(key = %stem, error = %e, "unreadable cache entry, treating as miss");
        None
      }
    }
  }

  /// Wait for exclusive use of `stem`.
  async fn acquire(&self, stem: &str) -> InFlightGuard {
    let lock = {
      let mut map = lock_map(&self.in_flight);
      Arc::clone(map.entry(stem.to_string()).or_default())
    };

    InFlightGuard {
      stem: stem.to_string(),
      map: Arc::clone(&self.in_flight),
      _guard: lock.lock_owned().await,
    }
  }

  #[cfg(test)]
  fn in_flight_len(&self) -> usize {
    lock_map(&self.in_flight).len()
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      in_flight: Arc::clone(&self.in_flight),
    }
  }
}

/// Holds the per-key lock. Removes the map entry when nobody else is waiting on it.
struct InFlightGuard {
  stem: String,
  map: InFlightMap,
  _guard: OwnedMutexGuard<()>,
}

impl Drop for InFlightGuard {
  fn drop(&mut self) {
    let mut map = lock_map(&self.map);
    // the map and our owned guard account for two references
    let idle = map
      .get(&self.stem)
      .is_some_and(|lock| Arc::strong_count(lock) == 2);
    if idle {
      map.remove(&self.stem);
    }
  }
}

fn lock_map(map: &InFlightMap) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
  match map.lock() {
    Ok(guard) => guard,
    Err(poisoned) => {
      warn!("recovered poisoned in-flight map");
      poisoned.into_inner()
    }
  }
}
