use serde_json::{Map, Value};
use std::fmt;

use super::cache::canonical_json;

/// One enumeration call: which API operation, in which region, with which parameters.
///
/// Parameters use the AWS wire names (`HostedZoneId`, `Filters`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub api: String,
  pub method: String,
  pub region: String,
  pub params: Value,
}

impl ApiRequest {
  pub fn new(api: &str, method: &str, region: &str) -> Self {
    Self {
      api: api.to_string(),
      method: method.to_string(),
      region: region.to_string(),
      params: Value::Object(Map::new()),
    }
  }

  /// Add a parameter, replacing any previous value under the same name.
  pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
    if let Value::Object(map) = &mut self.params {
      map.insert(name.to_string(), value.into());
    }
    self
  }

  pub fn has_params(&self) -> bool {
    match &self.params {
      Value::Object(map) => !map.is_empty(),
      Value::Null => false,
      _ => true,
    }
  }

  /// Parameters in canonical form: object keys sorted at every level.
  pub fn canonical_params(&self) -> String {
    canonical_json(&self.params)
  }
}

impl fmt::Display for ApiRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} [{}] {}",
      self.api,
      self.method,
      self.region,
      self.canonical_params()
    )
  }
}
