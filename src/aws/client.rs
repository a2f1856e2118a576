use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::AwsConfig;

use super::error::ListerError;
use super::request::ApiRequest;
use super::strategy::FetchStrategy;

/// The live-call boundary: performs one enumeration call against the provider.
#[async_trait]
pub trait ResourceLister: Send + Sync {
  async fn list(&self, request: &ApiRequest, strategy: FetchStrategy) -> Result<Value, ListerError>;
}

/// Stderr fragments the AWS CLI emits for failures worth retrying.
const RETRYABLE_MARKERS: &[&str] = &[
  "Throttling",
  "RequestLimitExceeded",
  "TooManyRequests",
  "SlowDown",
  "ServiceUnavailable",
  "InternalError",
  "InternalFailure",
  "RequestTimeout",
  "Could not connect to the endpoint URL",
  "Connection was closed",
  "Read timeout on endpoint URL",
];

/// Lists resources by running the AWS CLI, which handles credentials, signing and paging.
#[derive(Debug, Clone)]
pub struct AwsCliLister {
  program: String,
  profile: Option<String>,
}

impl AwsCliLister {
  pub fn new(config: &AwsConfig) -> Self {
    Self {
      program: config.cli.clone(),
      profile: config.profile.clone(),
    }
  }

  /// Arguments for one call, e.g.
  /// `ec2 describe-instances --region us-east-1 --output json --cli-input-json {...}`.
  pub fn command_args(&self, request: &ApiRequest, strategy: FetchStrategy) -> Vec<String> {
    let mut args = vec![
      cli_service(&request.api).to_string(),
      request.method.replace('_', "-"),
      "--region".to_string(),
      request.region.clone(),
      "--output".to_string(),
      "json".to_string(),
    ];

    if let Some(profile) = &self.profile {
      args.push("--profile".to_string());
      args.push(profile.clone());
    }

    if request.has_params() {
      args.push("--cli-input-json".to_string());
      args.push(request.canonical_params());
    }

    if !strategy.paginates() {
      args.push("--no-paginate".to_string());
    }

    args
  }
}

#[async_trait]
impl ResourceLister for AwsCliLister {
  async fn list(&self, request: &ApiRequest, strategy: FetchStrategy) -> Result<Value, ListerError> {
    let args = self.command_args(request, strategy);
    debug!(program = %self.program, ?args, "running aws cli");

    let output = Command::new(&self.program)
      .args(&args)
      .stdin(Stdio::null())
      .kill_on_drop(true)
      .output()
      .await
      .map_err(|source| ListerError::Spawn {
        program: self.program.clone(),
        source,
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      return Err(ListerError::Failed {
        status: output.status.code(),
        retryable: is_retryable(&stderr),
        stderr,
      });
    }

    let response = parse_output(&output.stdout)?;
    Ok(strategy.shape(response))
  }
}

/// The CLI names S3's object API `s3api`; every other service keeps its SDK name.
fn cli_service(api: &str) -> &str {
  match api {
    "s3" => "s3api",
    other => other,
  }
}

fn is_retryable(stderr: &str) -> bool {
  RETRYABLE_MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// Some operations print nothing at all when there is nothing to list.
fn parse_output(stdout: &[u8]) -> Result<Value, ListerError> {
  if stdout.iter().all(u8::is_ascii_whitespace) {
    return Ok(Value::Object(Default::default()));
  }
  serde_json::from_slice(stdout).map_err(|source| ListerError::InvalidOutput { source })
}
