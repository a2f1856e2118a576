use serde::{Serialize, Serializer};
use std::fmt;

/// Region tag for services that are not tied to a region (CloudFront, S3).
pub const GLOBAL_REGION: &str = "global";

/// Kind of resource a node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
  Dns,
  Cloudfront,
  Ec2,
  Elb,
  Rds,
  Asg,
  Redshift,
  Elasticache,
  Sqs,
  S3,
  Opensearch,
  #[allow(dead_code)]
  ExternalService,
  #[allow(dead_code)]
  Other(String),
}

impl NodeType {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Dns => "dns",
      Self::Cloudfront => "cloudfront",
      Self::Ec2 => "ec2",
      Self::Elb => "elb",
      Self::Rds => "rds",
      Self::Asg => "asg",
      Self::Redshift => "redshift",
      Self::Elasticache => "elasticache",
      Self::Sqs => "sqs",
      Self::S3 => "s3",
      Self::Opensearch => "opensearch",
      Self::ExternalService => "externalservice",
      Self::Other(name) => name,
    }
  }
}

impl fmt::Display for NodeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for NodeType {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

/// Label on a directed edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Relation {
  Depends,
  #[allow(dead_code)]
  Replicates,
  #[allow(dead_code)]
  Other(String),
}

impl Relation {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Depends => "depends",
      Self::Replicates => "replicates",
      Self::Other(label) => label,
    }
  }
}

impl fmt::Display for Relation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for Relation {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

/// An observation of a resource, before it is merged into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
  pub node_type: NodeType,
  pub name: String,
  pub description: String,
  pub region: Option<String>,
}

impl NewNode {
  pub fn new(node_type: NodeType, name: impl Into<String>) -> Self {
    Self {
      node_type,
      name: name.into(),
      description: String::new(),
      region: None,
    }
  }

  pub fn description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn region(mut self, region: impl Into<String>) -> Self {
    self.region = Some(region.into());
    self
  }
}

/// A merged node. `weight` counts how many times it was observed.
///
/// Field order is the column order of the nodes table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
  #[serde(rename = "type")]
  pub node_type: NodeType,
  pub name: String,
  pub description: String,
  pub weight: u64,
  pub region: Option<String>,
}

/// A directed, typed relation between two node identities.
///
/// Either end may name a node that is never upserted. `weight` is a routing
/// weight / multiplicity and is never clamped: 1 unless the source carries one
/// (Route53 weighted records).
///
/// Field order is the column order of the edges table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
  pub from_type: NodeType,
  pub from_name: String,
  #[serde(rename = "edge")]
  pub relation: Relation,
  pub to_type: NodeType,
  pub to_name: String,
  pub weight: u64,
}

impl Edge {
  /// A `depends` edge of weight 1.
  pub fn new(
    from_type: NodeType,
    from_name: impl Into<String>,
    to_type: NodeType,
    to_name: impl Into<String>,
  ) -> Self {
    Self {
      from_type,
      from_name: from_name.into(),
      relation: Relation::Depends,
      to_type,
      to_name: to_name.into(),
      weight: 1,
    }
  }

  #[allow(dead_code)]
  pub fn relation(mut self, relation: Relation) -> Self {
    self.relation = relation;
    self
  }

  pub fn weight(mut self, weight: u64) -> Self {
    self.weight = weight;
    self
  }
}
