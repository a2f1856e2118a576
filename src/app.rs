use color_eyre::{
  eyre::{eyre, WrapErr},
  Result,
};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::aws::{AwsCliLister, CachedAwsClient, RetryPolicy};
use crate::cache::{CacheLayer, FsStorage};
use crate::collectors::{resolve_account_id, CollectorKind, Context};
use crate::config::Config;
use crate::output;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
  pub account_id: Option<String>,
  pub nodes: usize,
  pub edges: usize,
  /// `kind@region` of every collector that failed and was skipped
  pub failed: Vec<String>,
  pub files: Vec<PathBuf>,
}

/// One collection run over every configured region.
pub struct App {
  config: Config,
  aws: CachedAwsClient,
}

impl App {
  pub fn new(config: Config, refresh: bool) -> Result<Self> {
    let storage = FsStorage::open(config.cache_dir.clone())
      .wrap_err_with(|| format!("Failed to open cache dir {}", config.cache_dir.display()))?;
    debug!(cache_dir = %storage.dir().display(), refresh, "cache ready");
    let lister = Arc::new(AwsCliLister::new(&config.aws));
    let aws = CachedAwsClient::new(lister, CacheLayer::new(storage), RetryPolicy::from(&config.fetch))
      .with_force_refresh(refresh);

    Ok(Self { config, aws })
  }

  #[cfg(test)]
  fn with_client(config: Config, aws: CachedAwsClient) -> Self {
    Self { config, aws }
  }

  /// Global collectors against the global region, then every regional collector
  /// for every region, in that order.
  fn jobs(&self) -> Vec<(CollectorKind, String)> {
    let global = CollectorKind::GLOBAL
      .iter()
      .map(|&kind| (kind, self.config.global_region.clone()));
    let regional = self
      .config
      .regions
      .iter()
      .flat_map(|region| CollectorKind::REGIONAL.iter().map(move |&kind| (kind, region.clone())));

    global.chain(regional).collect()
  }

  pub async fn run(&self) -> Result<RunSummary> {
    let account_id = resolve_account_id(&self.aws, &self.config.global_region).await;
    let ctx = Context::new(self.aws.clone(), account_id);

    let jobs = self.jobs();
    info!(
      jobs = jobs.len(),
      regions = self.config.regions.len(),
      concurrency = self.config.concurrency,
      "starting collection"
    );

    let mut failed = Vec::new();
    {
      let ctx = &ctx;
      let mut results = stream::iter(jobs)
        .map(move |(kind, region)| async move {
          let result = kind.collect(ctx, &region).await;
          (kind, region, result)
        })
        .buffer_unordered(self.config.concurrency);

      while let Some((kind, region, result)) = results.next().await {
        match result {
          Ok(()) => {
            let (nodes, edges) = ctx.graph.counts();
            debug!(collector = %kind, region = %region, nodes, edges, "collector finished");
          }
          Err(e) if self.config.fail_fast => {
            return Err(eyre!("{} collector failed in {}: {}", kind, region, e));
          }
          Err(e) => {
            error!(collector = %kind, region = %region, error = %e, "collector failed, skipping");
            failed.push(format!("{kind}@{region}"));
          }
        }
      }
    }

    let snapshot = ctx.graph.snapshot();
    let files = output::write_snapshot(&self.config.output_dir, &snapshot, ctx.account_id.as_deref())?;

    Ok(RunSummary {
      account_id: ctx.account_id.clone(),
      nodes: snapshot.nodes.len(),
      edges: snapshot.edges.len(),
      failed,
      files,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aws::stub::{client_with, StubLister};
  use serde_json::json;
  use std::path::Path;
  use tempfile::tempdir;

  fn config(root: &Path, regions: &[&str]) -> Config {
    Config {
      regions: regions.iter().map(|r| r.to_string()).collect(),
      cache_dir: root.join("cache"),
      output_dir: root.join("data"),
      concurrency: 1,
      ..Config::default()
    }
  }

  fn stub() -> StubLister {
    StubLister::new()
      .with_response("sts", "get_caller_identity", json!({"Account": "123456789012", "Arn": "arn:aws:iam::123456789012:root"}))
      .with_response("s3", "list_buckets", json!({"Buckets": [{"Name": "assets"}]}))
      .with_response(
        "sqs",
        "list_queues",
        json!({"QueueUrls": ["https://sqs.eu-west-1.amazonaws.com/123456789012/orders"]}),
      )
  }

  #[test]
  fn test_jobs_run_global_first() {
    let dir = tempdir().unwrap();
    let config = config(dir.path(), &["eu-west-1", "us-west-2"]);
    let app = App::with_client(config, client_with(&dir.path().join("cache"), Arc::new(StubLister::new())));

    let jobs = app.jobs();
    assert_eq!(jobs.len(), 3 + 2 * 9);
    assert_eq!(jobs[0], (CollectorKind::Route53, "us-east-1".to_string()));
    assert_eq!(jobs[2], (CollectorKind::S3, "us-east-1".to_string()));
    assert_eq!(jobs[3], (CollectorKind::Ec2, "eu-west-1".to_string()));
    assert_eq!(jobs[20], (CollectorKind::Opensearch, "us-west-2".to_string()));
  }

  #[tokio::test]
  async fn test_run_writes_graph() {
    let dir = tempdir().unwrap();
    let stub = Arc::new(stub());
    let config = config(dir.path(), &["eu-west-1"]);
    let app = App::with_client(config, client_with(&dir.path().join("cache"), stub.clone()));

    let summary = app.run().await.unwrap();

    assert_eq!(summary.account_id.as_deref(), Some("123456789012"));
    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.edges, 0);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.files.len(), 3);

    let nodes = std::fs::read_to_string(dir.path().join("data").join("nodes.csv")).unwrap();
    assert!(nodes.contains("s3,assets,assets,1,global"));
    assert!(nodes.contains("sqs,orders,"));

    // a second run is served from cache, apart from the uncached calls
    let before = stub.call_count();
    app.run().await.unwrap();
    let live: Vec<String> = stub.calls()[before..]
      .iter()
      .map(|r| format!("{} {}", r.api, r.method))
      .collect();
    assert_eq!(live, vec!["sts get_caller_identity", "elbv2 describe_load_balancers"]);
  }

  #[tokio::test]
  async fn test_failures_are_skipped_by_default() {
    let dir = tempdir().unwrap();
    let config = config(dir.path(), &["eu-west-1"]);
    let app = App::with_client(
      config,
      client_with(&dir.path().join("cache"), Arc::new(StubLister::new().with_permanent_failure())),
    );

    let summary = app.run().await.unwrap();

    assert_eq!(summary.account_id, None);
    assert_eq!(summary.failed.len(), 12);
    assert!(summary.failed.contains(&"route53@us-east-1".to_string()));
    assert!(dir.path().join("data").join("graph.json").exists());
  }

  #[tokio::test]
  async fn test_fail_fast_aborts() {
    let dir = tempdir().unwrap();
    let config = Config {
      fail_fast: true,
      ..config(dir.path(), &["eu-west-1"])
    };
    let app = App::with_client(
      config,
      client_with(&dir.path().join("cache"), Arc::new(StubLister::new().with_permanent_failure())),
    );

    let err = app.run().await.unwrap_err();

    assert!(err.to_string().contains("route53 collector failed in us-east-1"));
    assert!(!dir.path().join("data").join("graph.json").exists());
  }
}
