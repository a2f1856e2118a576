//! One collector per resource kind.
//!
//! Each collector enumerates its resources through the cached client and
//! routes every discovery into the shared graph. A collector that fails
//! part-way leaves whatever it already added in place.

mod compute;
mod data;
mod dns;
mod edge;
mod load_balancers;
mod messaging;

use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aws::{ApiCallerIdentity, ApiRequest, CachedAwsClient, FetchError};
use crate::graph::Graph;

/// Everything a collector needs, built once per run.
#[derive(Clone)]
pub struct Context {
  pub aws: CachedAwsClient,
  pub graph: Arc<Graph>,
  pub account_id: Option<String>,
}

impl Context {
  pub fn new(aws: CachedAwsClient, account_id: Option<String>) -> Self {
    Self {
      aws,
      graph: Arc::new(Graph::new()),
      account_id,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorKind {
  Route53,
  Cloudfront,
  S3,
  Ec2,
  Elb,
  Elbv2,
  Rds,
  Redshift,
  Elasticache,
  Asg,
  Sqs,
  Opensearch,
}

impl CollectorKind {
  /// Collected once, against the global region.
  pub const GLOBAL: &'static [CollectorKind] = &[Self::Route53, Self::Cloudfront, Self::S3];

  /// Collected once per configured region.
  pub const REGIONAL: &'static [CollectorKind] = &[
    Self::Ec2,
    Self::Elb,
    Self::Elbv2,
    Self::Rds,
    Self::Redshift,
    Self::Elasticache,
    Self::Asg,
    Self::Sqs,
    Self::Opensearch,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::Route53 => "route53",
      Self::Cloudfront => "cloudfront",
      Self::S3 => "s3",
      Self::Ec2 => "ec2",
      Self::Elb => "elb",
      Self::Elbv2 => "elbv2",
      Self::Rds => "rds",
      Self::Redshift => "redshift",
      Self::Elasticache => "elasticache",
      Self::Asg => "asg",
      Self::Sqs => "sqs",
      Self::Opensearch => "opensearch",
    }
  }

  pub async fn collect(self, ctx: &Context, region: &str) -> Result<(), FetchError> {
    match self {
      Self::Route53 => dns::collect_route53(ctx, region).await,
      Self::Cloudfront => edge::collect_cloudfront(ctx, region).await,
      Self::S3 => data::collect_s3(ctx, region).await,
      Self::Ec2 => compute::collect_ec2(ctx, region).await,
      Self::Elb => load_balancers::collect_elb(ctx, region).await,
      Self::Elbv2 => load_balancers::collect_elbv2(ctx, region).await,
      Self::Rds => data::collect_rds(ctx, region).await,
      Self::Redshift => data::collect_redshift(ctx, region).await,
      Self::Elasticache => data::collect_elasticache(ctx, region).await,
      Self::Asg => compute::collect_asg(ctx, region).await,
      Self::Sqs => messaging::collect_sqs(ctx, region).await,
      Self::Opensearch => data::collect_opensearch(ctx, region).await,
    }
  }
}

impl fmt::Display for CollectorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Look up the account the credentials belong to. Never served from cache.
pub async fn resolve_account_id(aws: &CachedAwsClient, region: &str) -> Option<String> {
  let request = ApiRequest::new("sts", "get_caller_identity", region);

  match aws.fetch_as::<ApiCallerIdentity>(&request, false).await {
    Ok(identity) => {
      info!(account = %identity.account, arn = %identity.arn, "resolved account");
      Some(identity.account)
    }
    Err(e) => {
      warn!(error = %e, "could not resolve account id");
      None
    }
  }
}

/// Normalize a DNS name: lowercase, no trailing dot, no `dualstack.` prefix.
pub fn fmt_dns(name: &str) -> String {
  name
    .to_lowercase()
    .trim_end_matches('.')
    .replace("dualstack.", "")
}
