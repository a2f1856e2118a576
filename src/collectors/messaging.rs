use crate::aws::{ApiRequest, FetchError};
use crate::graph::{NewNode, NodeType};

use super::Context;

/// SQS queues, named by the last segment of their URL.
pub async fn collect_sqs(ctx: &Context, region: &str) -> Result<(), FetchError> {
  let queue_urls: Vec<String> = ctx
    .aws
    .fetch_as(&ApiRequest::new("sqs", "list_queues", region), true)
    .await?;

  for url in queue_urls {
    let name = url.rsplit('/').next().unwrap_or_default().to_string();
    ctx
      .graph
      .upsert_node(NewNode::new(NodeType::Sqs, name).description(url).region(region));
  }

  Ok(())
}
