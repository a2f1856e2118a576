use crate::aws::{ApiHostedZones, ApiRecordSet, ApiRecordSets, ApiRequest, FetchError};
use crate::graph::{Edge, NewNode, NodeType};

use super::{fmt_dns, Context};

/// Walk every hosted zone and link CNAME/A records to what they point at.
pub async fn collect_route53(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let zones: ApiHostedZones = ctx
    .aws
    .fetch_as(&ApiRequest::new("route53", "list_hosted_zones", region), true)
    .await?;

  for zone in zones.hosted_zones {
    tracing::debug!(zone = %zone.name, id = %zone.id, "reading hosted zone");

    let records: ApiRecordSets = ctx
      .aws
      .fetch_as(
        &ApiRequest::new("route53", "list_resource_record_sets", region).param("HostedZoneId", zone.id.as_str()),
        true,
      )
      .await?;

    for record in &records.record_sets {
      add_record(ctx, record);
    }
  }

  Ok(())
}

fn add_record(ctx: &Context, record: &ApiRecordSet) {
  let is_a = record.record_type == "A";
  if !is_a && record.record_type != "CNAME" {
    return;
  }

  let name = fmt_dns(&record.name);
  let target = record_target(record);

  ctx
    .graph
    .upsert_node(NewNode::new(NodeType::Dns, name.clone()).description(record.record_type.clone()));

  // A record with neither alias nor value keeps its own node but gets no edge,
  // and no `dns ""` target node is created for it.
  if target.is_empty() {
    return;
  }

  ctx.graph.add_edge(
    Edge::new(NodeType::Dns, name, NodeType::Dns, target.clone()).weight(record.weight.unwrap_or(1)),
  );

  if is_a {
    ctx
      .graph
      .upsert_node(NewNode::new(NodeType::Dns, target).description(record.record_type.clone()));
  }
}

/// Alias target if present, otherwise the first record value.
fn record_target(record: &ApiRecordSet) -> String {
  let alias = record
    .alias_target
    .as_ref()
    .map(|a| fmt_dns(&a.dns_name))
    .unwrap_or_default();

  if !alias.is_empty() {
    return alias;
  }

  record
    .resource_records
    .first()
    .map(|r| fmt_dns(&r.value))
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aws::stub::StubLister;
  use crate::collectors::testing;
  use crate::graph::Edge;
  use serde_json::json;
  use tempfile::tempdir;

  fn stub() -> StubLister {
    StubLister::new()
      .with_response(
        "route53",
        "list_hosted_zones",
        json!({"HostedZones": [{"Id": "/hostedzone/Z1", "Name": "example.com."}]}),
      )
      .with_response(
        "route53",
        "list_resource_record_sets",
        json!({"ResourceRecordSets": [
          {"Name": "example.com.", "Type": "NS", "ResourceRecords": [{"Value": "ns-1.awsdns.com."}]},
          {"Name": "WWW.example.com.", "Type": "CNAME", "ResourceRecords": [{"Value": "d111.cloudfront.net"}]},
          {"Name": "api.example.com.", "Type": "A", "SetIdentifier": "blue", "Weight": 70,
            "AliasTarget": {"DNSName": "dualstack.api-lb-1.us-east-1.elb.amazonaws.com.", "HostedZoneId": "Z35"}},
          {"Name": "api.example.com.", "Type": "A", "SetIdentifier": "green", "Weight": 30,
            "AliasTarget": {"DNSName": "dualstack.api-lb-2.us-east-1.elb.amazonaws.com.", "HostedZoneId": "Z35"}},
          {"Name": "bare.example.com.", "Type": "A", "ResourceRecords": []}
        ]}),
      )
  }

  #[tokio::test]
  async fn test_records_become_dns_nodes_and_edges() {
    let dir = tempdir().unwrap();
    let (ctx, stub) = testing::context(dir.path(), stub());

    collect_route53(&ctx, "us-east-1").await.unwrap();

    let calls = stub.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].params, json!({"HostedZoneId": "/hostedzone/Z1"}));

    let snapshot = ctx.graph.snapshot();
    let nodes: Vec<(&str, &str, u64)> = snapshot
      .nodes
      .iter()
      .map(|n| (n.name.as_str(), n.description.as_str(), n.weight))
      .collect();
    assert_eq!(
      nodes,
      vec![
        ("www.example.com", "CNAME", 1),
        ("api.example.com", "A", 2),
        ("api-lb-1.us-east-1.elb.amazonaws.com", "A", 1),
        ("api-lb-2.us-east-1.elb.amazonaws.com", "A", 1),
        ("bare.example.com", "A", 1),
      ]
    );

    assert_eq!(
      snapshot.edges,
      vec![
        Edge::new(NodeType::Dns, "www.example.com", NodeType::Dns, "d111.cloudfront.net"),
        Edge::new(NodeType::Dns, "api.example.com", NodeType::Dns, "api-lb-1.us-east-1.elb.amazonaws.com").weight(70),
        Edge::new(NodeType::Dns, "api.example.com", NodeType::Dns, "api-lb-2.us-east-1.elb.amazonaws.com").weight(30),
      ]
    );
  }

  #[tokio::test]
  async fn test_second_run_is_served_from_cache() {
    let dir = tempdir().unwrap();
    let (ctx, stub) = testing::context(dir.path(), stub());

    collect_route53(&ctx, "us-east-1").await.unwrap();
    collect_route53(&ctx, "us-east-1").await.unwrap();

    assert_eq!(stub.call_count(), 2);
    // second pass repeats every observation
    assert_eq!(ctx.graph.snapshot().nodes[0].weight, 2);
    assert_eq!(ctx.graph.snapshot().edges.len(), 6);
  }
}
