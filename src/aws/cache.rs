//! Cache addressing for AWS requests.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::cache::QueryKey;

use super::request::ApiRequest;

impl QueryKey for ApiRequest {
  fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    for part in [&self.api, &self.method, &self.region] {
      hasher.update(part.as_bytes());
      hasher.update(b"\n");
    }
    hasher.update(self.canonical_params().as_bytes());
    hex::encode(hasher.finalize())
  }

  fn file_stem(&self) -> String {
    format!(
      "{}-{}-{}-{}",
      self.api,
      self.method,
      self.region,
      self.cache_hash()
    )
  }

  fn description(&self) -> String {
    self.to_string()
  }
}

/// Serialize a JSON value with object keys sorted at every nesting level.
///
/// Array order is kept: AWS treats list parameters as ordered.
pub fn canonical_json(value: &Value) -> String {
  let mut out = String::new();
  write_canonical(value, &mut out);
  out
}

fn write_canonical(value: &Value, out: &mut String) {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(&String, &Value)> = map.iter().collect();
      entries.sort_by(|a, b| a.0.cmp(b.0));

      out.push('{');
      for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(value, out);
      }
      out.push('}');
    }
    Value::Array(items) => {
      out.push('[');
      for (i, item) in items.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_canonical(item, out);
      }
      out.push(']');
    }
    scalar => out.push_str(&scalar.to_string()),
  }
}
