//! Serde-deserializable types matching AWS API responses.
//!
//! Only the fields the collectors read are declared; everything else in the
//! cached response is ignored. Field names follow the AWS wire format.

use serde::Deserialize;

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ApiEndpoint {
  #[serde(rename = "Address")]
  pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiInstanceRef {
  #[serde(rename = "InstanceId")]
  pub instance_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiTag {
  #[serde(rename = "Key")]
  pub key: String,
  #[serde(rename = "Value", default)]
  pub value: String,
}

// ============================================================================
// Route53
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiHostedZones {
  #[serde(rename = "HostedZones", default)]
  pub hosted_zones: Vec<ApiHostedZone>,
}

#[derive(Debug, Deserialize)]
pub struct ApiHostedZone {
  #[serde(rename = "Id")]
  pub id: String,
  #[serde(rename = "Name", default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiRecordSets {
  #[serde(rename = "ResourceRecordSets", default)]
  pub record_sets: Vec<ApiRecordSet>,
}

#[derive(Debug, Deserialize)]
pub struct ApiRecordSet {
  #[serde(rename = "Name")]
  pub name: String,
  #[serde(rename = "Type")]
  pub record_type: String,
  #[serde(rename = "Weight")]
  pub weight: Option<u64>,
  #[serde(rename = "ResourceRecords", default)]
  pub resource_records: Vec<ApiResourceRecord>,
  #[serde(rename = "AliasTarget")]
  pub alias_target: Option<ApiAliasTarget>,
}

#[derive(Debug, Deserialize)]
pub struct ApiResourceRecord {
  #[serde(rename = "Value", default)]
  pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiAliasTarget {
  #[serde(rename = "DNSName", default)]
  pub dns_name: String,
}

// ============================================================================
// CloudFront
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiDistributions {
  #[serde(rename = "DistributionList", default)]
  pub distribution_list: ApiDistributionList,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiDistributionList {
  #[serde(rename = "Items", default)]
  pub items: Vec<ApiDistribution>,
}

#[derive(Debug, Deserialize)]
pub struct ApiDistribution {
  #[serde(rename = "Id")]
  pub id: String,
  #[serde(rename = "DomainName")]
  pub domain_name: String,
  #[serde(rename = "HttpVersion", default)]
  pub http_version: String,
  #[serde(rename = "Origins", default)]
  pub origins: ApiOrigins,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiOrigins {
  #[serde(rename = "Items", default)]
  pub items: Vec<ApiOrigin>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOrigin {
  #[serde(rename = "DomainName")]
  pub domain_name: String,
}

// ============================================================================
// S3 (list_buckets is shaped down to the bucket list)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiBucket {
  #[serde(rename = "Name")]
  pub name: String,
}

// ============================================================================
// EC2
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiReservations {
  #[serde(rename = "Reservations", default)]
  pub reservations: Vec<ApiReservation>,
}

#[derive(Debug, Deserialize)]
pub struct ApiReservation {
  #[serde(rename = "Instances", default)]
  pub instances: Vec<ApiInstance>,
}

#[derive(Debug, Deserialize)]
pub struct ApiInstance {
  #[serde(rename = "InstanceId")]
  pub instance_id: String,
  #[serde(rename = "InstanceType", default)]
  pub instance_type: String,
  #[serde(rename = "PublicIpAddress")]
  pub public_ip_address: Option<String>,
  #[serde(rename = "Tags", default)]
  pub tags: Vec<ApiTag>,
}

impl ApiInstance {
  pub fn tag(&self, key: &str) -> Option<&str> {
    self
      .tags
      .iter()
      .find(|t| t.key == key)
      .map(|t| t.value.as_str())
  }
}

// ============================================================================
// Load balancers (classic and v2)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiClassicLoadBalancers {
  #[serde(rename = "LoadBalancerDescriptions", default)]
  pub load_balancers: Vec<ApiClassicLoadBalancer>,
}

#[derive(Debug, Deserialize)]
pub struct ApiClassicLoadBalancer {
  #[serde(rename = "DNSName")]
  pub dns_name: String,
  #[serde(rename = "LoadBalancerName")]
  pub name: String,
  #[serde(rename = "Instances", default)]
  pub instances: Vec<ApiInstanceRef>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoadBalancers {
  #[serde(rename = "LoadBalancers", default)]
  pub load_balancers: Vec<ApiLoadBalancer>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoadBalancer {
  #[serde(rename = "DNSName")]
  pub dns_name: String,
  #[serde(rename = "LoadBalancerName")]
  pub name: String,
  #[serde(rename = "LoadBalancerArn")]
  pub arn: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiTargetGroups {
  #[serde(rename = "TargetGroups", default)]
  pub target_groups: Vec<ApiTargetGroup>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTargetGroup {
  #[serde(rename = "TargetGroupArn")]
  pub arn: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiTargetHealth {
  #[serde(rename = "TargetHealthDescriptions", default)]
  pub descriptions: Vec<ApiTargetHealthDescription>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTargetHealthDescription {
  #[serde(rename = "Target")]
  pub target: ApiTarget,
}

#[derive(Debug, Deserialize)]
pub struct ApiTarget {
  #[serde(rename = "Id")]
  pub id: String,
}

// ============================================================================
// Databases and caches
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiDbInstances {
  #[serde(rename = "DBInstances", default)]
  pub instances: Vec<ApiDbInstance>,
}

#[derive(Debug, Deserialize)]
pub struct ApiDbInstance {
  #[serde(rename = "DBInstanceIdentifier")]
  pub identifier: String,
  #[serde(rename = "DBInstanceClass", default)]
  pub class: String,
  #[serde(rename = "Engine", default)]
  pub engine: String,
  #[serde(rename = "Endpoint")]
  pub endpoint: Option<ApiEndpoint>,
}

#[derive(Debug, Deserialize)]
pub struct ApiRedshiftClusters {
  #[serde(rename = "Clusters", default)]
  pub clusters: Vec<ApiRedshiftCluster>,
}

#[derive(Debug, Deserialize)]
pub struct ApiRedshiftCluster {
  #[serde(rename = "ClusterIdentifier")]
  pub identifier: String,
  #[serde(rename = "NodeType", default)]
  pub node_type: String,
  #[serde(rename = "Endpoint")]
  pub endpoint: Option<ApiEndpoint>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCacheClusters {
  #[serde(rename = "CacheClusters", default)]
  pub clusters: Vec<ApiCacheCluster>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCacheCluster {
  #[serde(rename = "CacheClusterId")]
  pub id: String,
  #[serde(rename = "CacheNodeType", default)]
  pub node_type: String,
  #[serde(rename = "Engine", default)]
  pub engine: String,
  #[serde(rename = "ConfigurationEndpoint")]
  pub configuration_endpoint: Option<ApiEndpoint>,
  #[serde(rename = "CacheNodes", default)]
  pub cache_nodes: Vec<ApiCacheNode>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCacheNode {
  #[serde(rename = "Endpoint")]
  pub endpoint: Option<ApiEndpoint>,
}

// ============================================================================
// Auto scaling
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiAutoScalingGroups {
  #[serde(rename = "AutoScalingGroups", default)]
  pub groups: Vec<ApiAutoScalingGroup>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAutoScalingGroup {
  #[serde(rename = "AutoScalingGroupName")]
  pub name: String,
  #[serde(rename = "LoadBalancerNames", default)]
  pub load_balancer_names: Vec<String>,
  #[serde(rename = "Instances", default)]
  pub instances: Vec<ApiInstanceRef>,
}

// ============================================================================
// OpenSearch
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiDomainNames {
  #[serde(rename = "DomainNames", default)]
  pub domain_names: Vec<ApiDomainName>,
}

#[derive(Debug, Deserialize)]
pub struct ApiDomainName {
  #[serde(rename = "DomainName")]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiDomain {
  #[serde(rename = "DomainStatus")]
  pub status: ApiDomainStatus,
}

#[derive(Debug, Deserialize)]
pub struct ApiDomainStatus {
  #[serde(rename = "DomainName")]
  pub name: String,
  #[serde(rename = "EngineVersion", default)]
  pub engine_version: String,
  #[serde(rename = "Endpoint")]
  pub endpoint: Option<String>,
  /// VPC domains expose their endpoints here instead of `Endpoint`
  #[serde(rename = "Endpoints", default)]
  pub endpoints: std::collections::BTreeMap<String, String>,
}

impl ApiDomainStatus {
  pub fn endpoint(&self) -> Option<&str> {
    self
      .endpoint
      .as_deref()
      .or_else(|| self.endpoints.values().next().map(String::as_str))
  }
}

// ============================================================================
// STS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiCallerIdentity {
  #[serde(rename = "Account")]
  pub account: String,
  #[serde(rename = "Arn", default)]
  pub arn: String,
}
