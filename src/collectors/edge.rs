use crate::aws::{ApiDistributions, ApiRequest, FetchError};
use crate::graph::{Edge, NewNode, NodeType, GLOBAL_REGION};

use super::{fmt_dns, Context};

/// CloudFront distributions, the DNS name each one gets, and the origins behind them.
pub async fn collect_cloudfront(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let response: ApiDistributions = ctx
    .aws
    .fetch_as(&ApiRequest::new("cloudfront", "list_distributions", region), true)
    .await?;

  for distribution in response.distribution_list.items {
    let domain = fmt_dns(&distribution.domain_name);

    ctx.graph.upsert_node(
      NewNode::new(NodeType::Cloudfront, domain.clone())
        .description(format!("{} {}", distribution.id, distribution.http_version))
        .region(GLOBAL_REGION),
    );
    ctx
      .graph
      .upsert_node(NewNode::new(NodeType::Dns, domain.clone()).description("A"));
    ctx
      .graph
      .add_edge(Edge::new(NodeType::Dns, domain.clone(), NodeType::Cloudfront, domain.clone()));

    for origin in &distribution.origins.items {
      ctx.graph.add_edge(Edge::new(
        NodeType::Cloudfront,
        domain.clone(),
        NodeType::Dns,
        fmt_dns(&origin.domain_name),
      ));
    }
  }

  Ok(())
}
