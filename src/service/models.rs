//! Request and response objects for the DCDB and VPC APIs.
//!
//! Field names follow the vendor's PascalCase wire format. Optional request
//! fields are skipped when `None`, so an absent field is never sent.

use serde::{Deserialize, Serialize};

// =============================================================================
// Shared
// =============================================================================

/// Key/value tag attached to an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_value: Option<String>,
}

/// Response carrying only the request id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmptyResponse {
    #[serde(default)]
    pub request_id: Option<String>,
}

// =============================================================================
// DCDB accounts
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAccountRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_user_connections: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreateAccountResponse {
    pub instance_id: Option<String>,
    pub user_name: Option<String>,
    pub host: Option<String>,
    pub read_only: Option<i64>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAccountsRequest {
    pub instance_id: String,
}

/// One database account
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DbAccount {
    pub user_name: Option<String>,
    pub host: Option<String>,
    pub description: Option<String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub read_only: Option<i64>,
    pub delay_thresh: Option<i64>,
    pub max_user_connections: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeAccountsResponse {
    pub instance_id: Option<String>,
    pub users: Vec<DbAccount>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyAccountDescriptionRequest {
    pub instance_id: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteAccountRequest {
    pub instance_id: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

// =============================================================================
// DCDB instances
// =============================================================================

/// Body of CreateDCDBInstance and CreateHourDCDBInstance; the hourly
/// variant never sets `period`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInstanceRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_storage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_node_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_tags: Vec<ResourceTag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreateInstanceResponse {
    pub deal_name: Option<String>,
    pub instance_ids: Vec<String>,
    pub flow_id: Option<i64>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDcdbInstancesRequest {
    pub instance_ids: Vec<String>,
}

/// One DCDB instance as returned by DescribeDCDBInstances
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DcdbInstanceInfo {
    pub instance_id: Option<String>,
    pub instance_name: Option<String>,
    pub project_id: Option<i64>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub status: Option<i64>,
    pub status_desc: Option<String>,
    pub vip: Option<String>,
    pub vport: Option<i64>,
    pub create_time: Option<String>,
    pub memory: Option<i64>,
    pub storage: Option<i64>,
    pub shard_count: Option<i64>,
    pub node_count: Option<i64>,
    pub unique_vpc_id: Option<String>,
    pub unique_subnet_id: Option<String>,
    pub db_version_id: Option<String>,
    pub paymode: Option<String>,
    pub resource_tags: Option<Vec<ResourceTag>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeDcdbInstancesResponse {
    pub total_count: Option<i64>,
    pub instances: Vec<DcdbInstanceInfo>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyDbInstanceNameRequest {
    pub instance_id: String,
    pub instance_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DestroyInstanceRequest {
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DestroyInstanceResponse {
    pub instance_id: Option<String>,
    pub flow_id: Option<i64>,
    pub request_id: Option<String>,
}

// =============================================================================
// DCDB security groups
// =============================================================================

/// Body of AssociateSecurityGroups and DisassociateSecurityGroups
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupBindingRequest {
    pub product: String,
    pub security_group_id: String,
    pub instance_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDbSecurityGroupsRequest {
    pub product: String,
    pub instance_id: String,
}

/// Security group bound to a DCDB instance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DbSecurityGroup {
    pub project_id: Option<i64>,
    pub create_time: Option<String>,
    pub security_group_id: Option<String>,
    pub security_group_name: Option<String>,
    pub security_group_remark: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeDbSecurityGroupsResponse {
    pub groups: Vec<DbSecurityGroup>,
    #[serde(rename = "VIP")]
    pub vip: Option<String>,
    #[serde(rename = "VPort")]
    pub vport: Option<i64>,
    pub request_id: Option<String>,
}

// =============================================================================
// VPC security groups
// =============================================================================

/// Name/values filter used by VPC describe calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: &str, values: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeSecurityGroupsRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    /// VPC paging parameters are strings on the wire
    pub offset: String,
    pub limit: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecurityGroup {
    pub security_group_id: Option<String>,
    pub security_group_name: Option<String>,
    pub security_group_desc: Option<String>,
    /// Project id as a decimal string
    pub project_id: Option<String>,
    pub is_default: Option<bool>,
    pub created_time: Option<String>,
    pub update_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeSecurityGroupsResponse {
    pub total_count: Option<u64>,
    pub security_group_set: Vec<SecurityGroup>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeSecurityGroupAssociationStatisticsRequest {
    pub security_group_ids: Vec<String>,
}

/// Usage counts of one security group per product
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityGroupAssociationStatistics {
    #[serde(rename = "SecurityGroupId")]
    pub security_group_id: Option<String>,
    #[serde(rename = "CVM")]
    pub cvm: u64,
    #[serde(rename = "CDB")]
    pub cdb: u64,
    #[serde(rename = "ENI")]
    pub eni: u64,
    #[serde(rename = "SG")]
    pub sg: u64,
    #[serde(rename = "CLB")]
    pub clb: u64,
    #[serde(rename = "TotalCount")]
    pub total_count: u64,
}

impl SecurityGroupAssociationStatistics {
    /// Bindings counted by the data source
    pub fn bound_count(&self) -> u64 {
        self.cvm + self.eni + self.cdb + self.clb
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeSecurityGroupAssociationStatisticsResponse {
    pub security_group_association_statistics_set: Vec<SecurityGroupAssociationStatistics>,
    pub request_id: Option<String>,
}
