use crate::aws::{
  ApiClassicLoadBalancers, ApiLoadBalancers, ApiRequest, ApiTargetGroups, ApiTargetHealth, FetchError,
};
use crate::graph::{Edge, NewNode, NodeType};

use super::{fmt_dns, Context};

/// Classic load balancers and their registered instances.
pub async fn collect_elb(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let response: ApiClassicLoadBalancers = ctx
    .aws
    .fetch_as(&ApiRequest::new("elb", "describe_load_balancers", region), true)
    .await?;

  for lb in response.load_balancers {
    let name = fmt_dns(&lb.dns_name);

    ctx.graph.upsert_node(
      NewNode::new(NodeType::Elb, name.clone())
        .description(lb.name)
        .region(region),
    );

    for instance in lb.instances {
      ctx
        .graph
        .add_edge(Edge::new(NodeType::Elb, name.clone(), NodeType::Ec2, instance.instance_id));
    }
  }

  Ok(())
}

/// Application/network load balancers, their DNS names and every target behind them.
///
/// The load balancer listing is always read live; target groups and target
/// health go through the cache.
pub async fn collect_elbv2(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let response: ApiLoadBalancers = ctx
    .aws
    .fetch_as(&ApiRequest::new("elbv2", "describe_load_balancers", region), false)
    .await?;

  for lb in response.load_balancers {
    let name = fmt_dns(&lb.dns_name);

    ctx.graph.upsert_node(
      NewNode::new(NodeType::Elb, name.clone())
        .description(lb.name.clone())
        .region(region),
    );
    ctx
      .graph
      .upsert_node(NewNode::new(NodeType::Dns, name.clone()).description("A"));
    ctx
      .graph
      .add_edge(Edge::new(NodeType::Dns, name.clone(), NodeType::Elb, name.clone()));

    let groups: ApiTargetGroups = ctx
      .aws
      .fetch_as(
        &ApiRequest::new("elbv2", "describe_target_groups", region).param("LoadBalancerArn", lb.arn.as_str()),
        true,
      )
      .await?;

    for group in groups.target_groups {
      let health: ApiTargetHealth = ctx
        .aws
        .fetch_as(
          &ApiRequest::new("elbv2", "describe_target_health", region).param("TargetGroupArn", group.arn.as_str()),
          true,
        )
        .await?;

      for description in health.descriptions {
        ctx.graph.add_edge(Edge::new(
          NodeType::Elb,
          name.clone(),
          NodeType::Ec2,
          description.target.id,
        ));
      }
    }
  }

  Ok(())
}
