use serde_json::json;

use crate::aws::{ApiAutoScalingGroups, ApiRequest, ApiReservations, FetchError};
use crate::graph::{Edge, NewNode, NodeType};

use super::{fmt_dns, Context};

/// Running EC2 instances and their public addresses.
pub async fn collect_ec2(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let request = ApiRequest::new("ec2", "describe_instances", region).param(
    "Filters",
    json!([{"Name": "instance-state-name", "Values": ["running"]}]),
  );
  let response: ApiReservations = ctx.aws.fetch_as(&request, true).await?;

  for instance in response.reservations.iter().flat_map(|r| &r.instances) {
    let description = [
      instance.tag("Name").unwrap_or_default(),
      instance.tag("InstRole").unwrap_or_default(),
      instance.instance_type.as_str(),
    ]
    .join(" ");

    ctx.graph.upsert_node(
      NewNode::new(NodeType::Ec2, instance.instance_id.clone())
        .description(description.clone())
        .region(region),
    );

    if let Some(ip) = &instance.public_ip_address {
      ctx.graph.upsert_node(
        NewNode::new(NodeType::Dns, ip.clone())
          .description(description)
          .region(region),
      );
      ctx.graph.add_edge(Edge::new(
        NodeType::Ec2,
        instance.instance_id.clone(),
        NodeType::Dns,
        ip.clone(),
      ));
    }
  }

  Ok(())
}

/// Auto scaling groups, linked to their classic load balancers and member instances.
pub async fn collect_asg(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let response: ApiAutoScalingGroups = ctx
    .aws
    .fetch_as(
      &ApiRequest::new("autoscaling", "describe_auto_scaling_groups", region),
      true,
    )
    .await?;

  for group in response.groups {
    let name = fmt_dns(&group.name);

    ctx.graph.upsert_node(
      NewNode::new(NodeType::Asg, name.clone())
        .description(group.name.clone())
        .region(region),
    );

    for lb in &group.load_balancer_names {
      ctx
        .graph
        .add_edge(Edge::new(NodeType::Asg, name.clone(), NodeType::Elb, fmt_dns(lb)));
    }

    for instance in &group.instances {
      ctx.graph.add_edge(Edge::new(
        NodeType::Asg,
        name.clone(),
        NodeType::Ec2,
        instance.instance_id.clone(),
      ));
    }
  }

  Ok(())
}
