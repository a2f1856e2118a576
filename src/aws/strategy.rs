use serde_json::Value;

/// How a live call is made for a given (api, method).
///
/// Most enumeration operations page uniformly. The few that don't are
/// listed in [`FetchStrategy::for_call`] so the cache never has to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
  /// Follow every page and merge the results
  Paginated,
  /// One request, response returned as-is
  SingleCall,
  /// One request, only this top-level field of the response is kept (default `[]`)
  Extract(&'static str),
}

impl FetchStrategy {
  pub fn for_call(api: &str, method: &str) -> Self {
    match (api, method) {
      ("s3", "list_buckets") => Self::Extract("Buckets"),
      ("sqs", "list_queues") => Self::Extract("QueueUrls"),
      ("elbv2", "describe_target_health") => Self::SingleCall,
      ("opensearch", "list_domain_names") => Self::SingleCall,
      ("opensearch", "describe_domain") => Self::SingleCall,
      ("sts", "get_caller_identity") => Self::SingleCall,
      _ => Self::Paginated,
    }
  }

  pub fn paginates(self) -> bool {
    matches!(self, Self::Paginated)
  }

  /// Reduce a raw response to the shape callers receive.
  pub fn shape(self, response: Value) -> Value {
    match self {
      Self::Extract(field) => match response {
        Value::Object(mut map) => map.remove(field).unwrap_or_else(|| Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
      },
      _ => response,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_irregular_operations() {
    assert_eq!(FetchStrategy::for_call("s3", "list_buckets"), FetchStrategy::Extract("Buckets"));
    assert_eq!(FetchStrategy::for_call("sqs", "list_queues"), FetchStrategy::Extract("QueueUrls"));
    assert_eq!(
      FetchStrategy::for_call("elbv2", "describe_target_health"),
      FetchStrategy::SingleCall
    );
  }

  #[test]
  fn test_default_is_paginated() {
    assert!(FetchStrategy::for_call("ec2", "describe_instances").paginates());
    assert!(FetchStrategy::for_call("elbv2", "describe_target_groups").paginates());
  }

  #[test]
  fn test_extract_defaults_to_empty_list() {
    let shaped = FetchStrategy::Extract("QueueUrls").shape(json!({}));
    assert_eq!(shaped, json!([]));

    let shaped = FetchStrategy::Extract("Buckets").shape(json!({
      "Buckets": [{"Name": "logs"}],
      "Owner": {"ID": "abc"}
    }));
    assert_eq!(shaped, json!([{"Name": "logs"}]));
  }
}
