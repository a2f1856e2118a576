//! Storage services: S3, RDS, Redshift, ElastiCache and OpenSearch.

use tracing::debug;

use crate::aws::{
  ApiBucket, ApiCacheCluster, ApiCacheClusters, ApiDbInstances, ApiDomain, ApiDomainNames, ApiEndpoint,
  ApiRedshiftClusters, ApiRequest, FetchError,
};
use crate::graph::{Edge, NewNode, NodeType, GLOBAL_REGION};

use super::{fmt_dns, Context};

pub async fn collect_s3(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let buckets: Vec<ApiBucket> = ctx
    .aws
    .fetch_as(&ApiRequest::new("s3", "list_buckets", region), true)
    .await?;

  for bucket in buckets {
    ctx.graph.upsert_node(
      NewNode::new(NodeType::S3, bucket.name.clone())
        .description(bucket.name)
        .region(GLOBAL_REGION),
    );
  }

  Ok(())
}

/// RDS instances, named by endpoint, each with a matching DNS node.
pub async fn collect_rds(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let response: ApiDbInstances = ctx
    .aws
    .fetch_as(&ApiRequest::new("rds", "describe_db_instances", region), true)
    .await?;

  for db in response.instances {
    // instances still being created have no endpoint yet
    let name = endpoint_name(db.endpoint.as_ref()).unwrap_or_else(|| db.identifier.clone());

    ctx.graph.upsert_node(
      NewNode::new(NodeType::Rds, name.clone())
        .description(format!("{} {} {}", db.identifier, db.class, db.engine))
        .region(region),
    );
    ctx.graph.upsert_node(
      NewNode::new(NodeType::Dns, name.clone())
        .description("A")
        .region(region),
    );
    ctx
      .graph
      .add_edge(Edge::new(NodeType::Dns, name.clone(), NodeType::Rds, name));
  }

  Ok(())
}

pub async fn collect_redshift(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let response: ApiRedshiftClusters = ctx
    .aws
    .fetch_as(&ApiRequest::new("redshift", "describe_clusters", region), true)
    .await?;

  for cluster in response.clusters {
    let name = endpoint_name(cluster.endpoint.as_ref()).unwrap_or_else(|| cluster.identifier.clone());

    ctx.graph.upsert_node(
      NewNode::new(NodeType::Redshift, name)
        .description(format!("{} {}", cluster.identifier, cluster.node_type))
        .region(region),
    );
  }

  Ok(())
}

pub async fn collect_elasticache(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let response: ApiCacheClusters = ctx
    .aws
    .fetch_as(
      &ApiRequest::new("elasticache", "describe_cache_clusters", region).param("ShowCacheNodeInfo", true),
      true,
    )
    .await?;

  for cluster in response.clusters {
    ctx.graph.upsert_node(
      NewNode::new(NodeType::Elasticache, cache_cluster_name(&cluster))
        .description(format!("{} {} {}", cluster.id, cluster.node_type, cluster.engine))
        .region(region),
    );
  }

  Ok(())
}

/// OpenSearch domains. Listing gives only names, so each domain is described on its own.
pub async fn collect_opensearch(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let names: ApiDomainNames = ctx
    .aws
    .fetch_as(&ApiRequest::new("opensearch", "list_domain_names", region), true)
    .await?;

  for domain in names.domain_names {
    let described: ApiDomain = ctx
      .aws
      .fetch_as(
        &ApiRequest::new("opensearch", "describe_domain", region).param("DomainName", domain.name.as_str()),
        true,
      )
      .await?;
    let status = described.status;
    let endpoint = status.endpoint().map(fmt_dns).filter(|e| !e.is_empty());
    let name = endpoint.clone().unwrap_or_else(|| status.name.clone());

    ctx.graph.upsert_node(
      NewNode::new(NodeType::Opensearch, name.clone())
        .description(format!("{} {}", status.name, status.engine_version))
        .region(region),
    );

    match endpoint {
      Some(endpoint) => {
        ctx.graph.upsert_node(
          NewNode::new(NodeType::Dns, endpoint.clone())
            .description("A")
            .region(region),
        );
        ctx
          .graph
          .add_edge(Edge::new(NodeType::Dns, endpoint, NodeType::Opensearch, name));
      }
      None => debug!(domain = %status.name, "domain has no endpoint yet"),
    }
  }

  Ok(())
}

fn endpoint_name(endpoint: Option<&ApiEndpoint>) -> Option<String> {
  endpoint
    .and_then(|e| e.address.as_deref())
    .map(fmt_dns)
    .filter(|name| !name.is_empty())
}

/// The configuration endpoint for clustered engines, else the first node's endpoint.
fn cache_cluster_name(cluster: &ApiCacheCluster) -> String {
  if let Some(address) = cluster
    .configuration_endpoint
    .as_ref()
    .and_then(|e| e.address.clone())
  {
    return address;
  }

  cluster
    .cache_nodes
    .first()
    .and_then(|node| endpoint_name(node.endpoint.as_ref()))
    .unwrap_or_else(|| cluster.id.clone())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aws::stub::StubLister;
  use crate::collectors::testing;
  use serde_json::json;
  use tempfile::tempdir;

  #[tokio::test]
  async fn test_buckets_are_global() {
    let dir = tempdir().unwrap();
    let (ctx, _stub) = testing::context(
      dir.path(),
      StubLister::new().with_response(
        "s3",
        "list_buckets",
        json!({"Buckets": [{"Name": "assets", "CreationDate": "2020-01-01T00:00:00+00:00"}], "Owner": {"ID": "x"}}),
      ),
    );

    collect_s3(&ctx, "us-east-1").await.unwrap();
    let nodes = ctx.graph.snapshot().nodes;

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].node_type, NodeType::S3);
    assert_eq!(nodes[0].name, "assets");
    assert_eq!(nodes[0].description, "assets");
    assert_eq!(nodes[0].region.as_deref(), Some(GLOBAL_REGION));
  }

  #[tokio::test]
  async fn test_rds_instance_and_dns() {
    let dir = tempdir().unwrap();
    let (ctx, _stub) = testing::context(
      dir.path(),
      StubLister::new().with_response(
        "rds",
        "describe_db_instances",
        json!({"DBInstances": [
          {"DBInstanceIdentifier": "orders", "DBInstanceClass": "db.r5.large", "Engine": "postgres",
            "Endpoint": {"Address": "Orders.abc.us-east-1.rds.amazonaws.com", "Port": 5432}},
          {"DBInstanceIdentifier": "pending", "DBInstanceClass": "db.t3.micro", "Engine": "mysql"}
        ]}),
      ),
    );

    collect_rds(&ctx, "us-east-1").await.unwrap();
    let snapshot = ctx.graph.snapshot();
    let endpoint = "orders.abc.us-east-1.rds.amazonaws.com";

    assert_eq!(snapshot.nodes.len(), 4);
    assert_eq!(snapshot.nodes[0].node_type, NodeType::Rds);
    assert_eq!(snapshot.nodes[0].name, endpoint);
    assert_eq!(snapshot.nodes[0].description, "orders db.r5.large postgres");
    assert_eq!(snapshot.nodes[1].node_type, NodeType::Dns);
    assert_eq!(snapshot.nodes[1].region.as_deref(), Some("us-east-1"));
    assert_eq!(snapshot.nodes[2].name, "pending");
    assert_eq!(snapshot.edges[0], Edge::new(NodeType::Dns, endpoint, NodeType::Rds, endpoint));
    assert_eq!(snapshot.edges.len(), 2);
  }

  #[tokio::test]
  async fn test_redshift_cluster() {
    let dir = tempdir().unwrap();
    let (ctx, _stub) = testing::context(
      dir.path(),
      StubLister::new().with_response(
        "redshift",
        "describe_clusters",
        json!({"Clusters": [{
          "ClusterIdentifier": "warehouse",
          "NodeType": "ra3.xlplus",
          "Endpoint": {"Address": "warehouse.xyz.us-west-2.redshift.amazonaws.com", "Port": 5439}
        }]}),
      ),
    );

    collect_redshift(&ctx, "us-west-2").await.unwrap();
    let snapshot = ctx.graph.snapshot();

    assert_eq!(snapshot.nodes.len(), 1);
    assert_eq!(snapshot.nodes[0].name, "warehouse.xyz.us-west-2.redshift.amazonaws.com");
    assert_eq!(snapshot.nodes[0].description, "warehouse ra3.xlplus");
    assert!(snapshot.edges.is_empty());
  }

  #[tokio::test]
  async fn test_elasticache_naming() {
    let dir = tempdir().unwrap();
    let (ctx, stub) = testing::context(
      dir.path(),
      StubLister::new().with_response(
        "elasticache",
        "describe_cache_clusters",
        json!({"CacheClusters": [
          {"CacheClusterId": "sessions", "CacheNodeType": "cache.m5.large", "Engine": "memcached",
            "ConfigurationEndpoint": {"Address": "sessions.cfg.use1.cache.amazonaws.com", "Port": 11211}},
          {"CacheClusterId": "queue-001", "CacheNodeType": "cache.t3.small", "Engine": "redis",
            "CacheNodes": [{"Endpoint": {"Address": "Queue-001.abc.0001.use1.cache.amazonaws.com."}}]}
        ]}),
      ),
    );

    collect_elasticache(&ctx, "us-east-1").await.unwrap();
    let nodes = ctx.graph.snapshot().nodes;

    assert_eq!(stub.calls()[0].params, json!({"ShowCacheNodeInfo": true}));
    assert_eq!(nodes[0].name, "sessions.cfg.use1.cache.amazonaws.com");
    assert_eq!(nodes[0].description, "sessions cache.m5.large memcached");
    assert_eq!(nodes[1].name, "queue-001.abc.0001.use1.cache.amazonaws.com");
    assert_eq!(nodes[1].description, "queue-001 cache.t3.small redis");
  }

  #[tokio::test]
  async fn test_opensearch_domain() {
    let dir = tempdir().unwrap();
    let (ctx, stub) = testing::context(
      dir.path(),
      StubLister::new()
        .with_response(
          "opensearch",
          "list_domain_names",
          json!({"DomainNames": [{"DomainName": "logs", "EngineType": "OpenSearch"}]}),
        )
        .with_response(
          "opensearch",
          "describe_domain",
          json!({"DomainStatus": {
            "DomainName": "logs",
            "EngineVersion": "OpenSearch_2.11",
            "Endpoints": {"vpc": "vpc-logs-abc.eu-west-1.es.amazonaws.com"}
          }}),
        ),
    );

    collect_opensearch(&ctx, "eu-west-1").await.unwrap();
    let snapshot = ctx.graph.snapshot();
    let endpoint = "vpc-logs-abc.eu-west-1.es.amazonaws.com";

    assert_eq!(stub.calls()[1].params, json!({"DomainName": "logs"}));
    assert_eq!(snapshot.nodes[0].node_type, NodeType::Opensearch);
    assert_eq!(snapshot.nodes[0].name, endpoint);
    assert_eq!(snapshot.nodes[0].description, "logs OpenSearch_2.11");
    assert_eq!(snapshot.nodes[1].node_type, NodeType::Dns);
    assert_eq!(
      snapshot.edges,
      vec![Edge::new(NodeType::Dns, endpoint, NodeType::Opensearch, endpoint)]
    );
  }

  #[tokio::test]
  async fn test_opensearch_domain_without_endpoint() {
    let dir = tempdir().unwrap();
    let (ctx, _stub) = testing::context(
      dir.path(),
      StubLister::new()
        .with_response("opensearch", "list_domain_names", json!({"DomainNames": [{"DomainName": "new"}]}))
        .with_response(
          "opensearch",
          "describe_domain",
          json!({"DomainStatus": {"DomainName": "new", "EngineVersion": "OpenSearch_2.11", "Processing": true}}),
        ),
    );

    collect_opensearch(&ctx, "eu-west-1").await.unwrap();
    let snapshot = ctx.graph.snapshot();

    assert_eq!(snapshot.nodes.len(), 1);
    assert_eq!(snapshot.nodes[0].name, "new");
    assert!(snapshot.edges.is_empty());
  }
}
