//! In-memory lister for tests: canned responses, recorded calls, scripted failures.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{CacheLayer, FsStorage};

use super::cached_client::{CachedAwsClient, RetryPolicy};
use super::client::ResourceLister;
use super::error::ListerError;
use super::request::ApiRequest;
use super::strategy::FetchStrategy;

#[derive(Default)]
pub struct StubLister {
  responses: HashMap<(String, String), Value>,
  calls: Mutex<Vec<ApiRequest>>,
  transient_failures: Mutex<u32>,
  permanent_failure: bool,
  delay: Option<Duration>,
}

impl StubLister {
  pub fn new() -> Self {
    Self::default()
  }

  /// Respond to every call of `api`/`method` with `response` (before strategy shaping).
  pub fn with_response(mut self, api: &str, method: &str, response: Value) -> Self {
    self
      .responses
      .insert((api.to_string(), method.to_string()), response);
    self
  }

  pub fn with_transient_failures(self, count: u32) -> Self {
    *self.transient_failures.lock().unwrap() = count;
    self
  }

  pub fn with_permanent_failure(mut self) -> Self {
    self.permanent_failure = true;
    self
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn calls(&self) -> Vec<ApiRequest> {
    self.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self) -> usize {
    self.calls.lock().unwrap().len()
  }
}

#[async_trait]
impl ResourceLister for StubLister {
  async fn list(&self, request: &ApiRequest, strategy: FetchStrategy) -> Result<Value, ListerError> {
    self.calls.lock().unwrap().push(request.clone());

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    if self.permanent_failure {
      return Err(ListerError::Failed {
        status: Some(254),
        stderr: "An error occurred (AccessDenied)".to_string(),
        retryable: false,
      });
    }

    {
      let mut remaining = self.transient_failures.lock().unwrap();
      if *remaining > 0 {
        *remaining -= 1;
        return Err(ListerError::Failed {
          status: Some(254),
          stderr: "An error occurred (ThrottlingException): Rate exceeded".to_string(),
          retryable: true,
        });
      }
    }

    let response = self
      .responses
      .get(&(request.api.clone(), request.method.clone()))
      .cloned()
      .unwrap_or_else(|| Value::Object(Default::default()));

    Ok(strategy.shape(response))
  }
}

/// A client over `stub`, caching under `dir`, with short timeouts and two retries.
pub fn client_with(dir: &Path, stub: Arc<StubLister>) -> CachedAwsClient {
  let storage = FsStorage::open(dir).unwrap();
  let policy = RetryPolicy {
    timeout: Duration::from_millis(100),
    max_retries: 2,
    backoff: Duration::from_millis(1),
  };
  CachedAwsClient::new(stub, CacheLayer::new(storage), policy)
}
