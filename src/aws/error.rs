use std::time::Duration;
use thiserror::Error;

use crate::cache::{LayerError, StorageError};

/// Failure of a single live call.
#[derive(Debug, Error)]
pub enum ListerError {
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },
  #[error("exit status {status:?}: {stderr}")]
  Failed {
    status: Option<i32>,
    stderr: String,
    retryable: bool,
  },
  #[error("unparseable output: {source}")]
  InvalidOutput {
    #[source]
    source: serde_json::Error,
  },
}

impl ListerError {
  /// Whether retrying the same call may succeed (throttling, 5xx, connectivity).
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Failed { retryable: true, .. })
  }
}

/// Failure of a cached fetch. Always names the request that failed.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("{request}: {source}")]
  CacheWrite {
    request: String,
    #[source]
    source: StorageError,
  },
  #[error("{request} failed after {attempts} attempt(s): {source}")]
  ExternalCall {
    request: String,
    attempts: u32,
    #[source]
    source: ListerError,
  },
  #[error("{request} timed out after {attempts} attempt(s) of {timeout:?}")]
  Timeout {
    request: String,
    attempts: u32,
    timeout: Duration,
  },
  #[error("{request}: unexpected response shape: {source}")]
  Decode {
    request: String,
    #[source]
    source: serde_json::Error,
  },
}

impl From<LayerError<FetchError>> for FetchError {
  fn from(err: LayerError<FetchError>) -> Self {
    match err {
      LayerError::Fetch(e) => e,
      LayerError::Write { request, source } => Self::CacheWrite { request, source },
    }
  }
}
