//! AWS client with transparent request caching, timeouts and retries.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayer, CacheResult, FsStorage};
use crate::config::FetchConfig;

use super::client::ResourceLister;
use super::error::FetchError;
use super::request::ApiRequest;
use super::strategy::FetchStrategy;

/// Bounds on a single live call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  pub timeout: Duration,
  pub max_retries: u32,
  pub backoff: Duration,
}

impl RetryPolicy {
  /// Delay before retry number `attempt` (1-based): backoff, 2x, 4x, ... capped at 64x.
  pub fn delay(&self, attempt: u32) -> Duration {
    self.backoff * 2u32.pow(attempt.saturating_sub(1).min(6))
  }
}

impl From<&FetchConfig> for RetryPolicy {
  fn from(config: &FetchConfig) -> Self {
    Self {
      timeout: Duration::from_secs(config.timeout_secs),
      max_retries: config.max_retries,
      backoff: Duration::from_millis(config.retry_backoff_ms),
    }
  }
}

/// Every outbound enumeration call goes through here.
///
/// Whether a call may be served from cache is the caller's decision, per call.
/// `force_refresh` overrides it for a whole run.
#[derive(Clone)]
pub struct CachedAwsClient {
  lister: Arc<dyn ResourceLister>,
  cache: CacheLayer<FsStorage>,
  retry: RetryPolicy,
  force_refresh: bool,
}

impl CachedAwsClient {
  pub fn new(lister: Arc<dyn ResourceLister>, cache: CacheLayer<FsStorage>, retry: RetryPolicy) -> Self {
    Self {
      lister,
      cache,
      retry,
      force_refresh: false,
    }
  }

  pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
    self.force_refresh = force_refresh;
    self
  }

  /// Fetch a raw response, from cache when `use_cache` is set and an entry exists.
  pub async fn fetch(&self, request: &ApiRequest, use_cache: bool) -> Result<CacheResult<Value>, FetchError> {
    let use_cache = use_cache && !self.force_refresh;

    let result = self
      .cache
      .fetch(request, use_cache, || self.call_live(request))
      .await?;

    if result.is_cached() {
      debug!(request = %request, cached_at = ?result.cached_at, "served from cache");
    }

    Ok(result)
  }

  /// Fetch and decode into a typed response.
  ///
  /// A cached entry that does not decode is treated as a miss and refetched live.
  pub async fn fetch_as<T: DeserializeOwned>(&self, request: &ApiRequest, use_cache: bool) -> Result<T, FetchError> {
    let result = self.fetch(request, use_cache).await?;
    let cached = result.is_cached();

    let data = match serde_json::from_value(result.data) {
      Ok(decoded) => return Ok(decoded),
      Err(e) if cached => {
        warn!(request = %request, error = %e, "cached entry has unexpected shape, refetching");
        self.fetch(request, false).await?.data
      }
      Err(source) => return Err(decode_error(request, source)),
    };

    serde_json::from_value(data).map_err(|source| decode_error(request, source))
  }

  async fn call_live(&self, request: &ApiRequest) -> Result<Value, FetchError> {
    let strategy = FetchStrategy::for_call(&request.api, &request.method);
    let mut attempt = 0;

    loop {
      attempt += 1;
      info!(
        api = %request.api,
        method = %request.method,
        region = %request.region,
        attempt,
        "calling aws"
      );

      let outcome = tokio::time::timeout(self.retry.timeout, self.lister.list(request, strategy)).await;
      let can_retry = attempt <= self.retry.max_retries;

      match outcome {
        Ok(Ok(response)) => return Ok(response),
        Ok(Err(e)) if e.is_retryable() && can_retry => {
          warn!(request = %request, attempt, error = %e, "transient failure, retrying");
        }
        Ok(Err(source)) => {
          return Err(FetchError::ExternalCall {
            request: request.to_string(),
            attempts: attempt,
            source,
          });
        }
        Err(_) if can_retry => {
          warn!(request = %request, attempt, timeout = ?self.retry.timeout, "call timed out, retrying");
        }
        Err(_) => {
          return Err(FetchError::Timeout {
            request: request.to_string(),
            attempts: attempt,
            timeout: self.retry.timeout,
          });
        }
      }

      tokio::time::sleep(self.retry.delay(attempt)).await;
    }
  }
}

fn decode_error(request: &ApiRequest, source: serde_json::Error) -> FetchError {
  FetchError::Decode {
    request: request.to_string(),
    source,
  }
}
