//! `tencentcloud_security_groups` data source
//!
//! Lists VPC security groups matching at most one filter family (id, or
//! name/project) and enriches each with its association count.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::write_result_output_file;
use crate::error::{ProviderError, Result};
use crate::provider::Provider;
use crate::resource::schema::{FieldKind, FieldSchema, ResourceSchema};
use crate::retry::retry_with_timeout;
use crate::service::models::SecurityGroup;
use crate::service::vpc::SecurityGroupFilter;

pub const TYPE_NAME: &str = "tencentcloud_security_groups";

/// Prefix of the aggregate identity
const ID_PREFIX: &str = "securityGroups-";

/// Statistics calls in flight at once
const ENRICH_CONCURRENCY: usize = 4;

const FIELDS: &[FieldSchema] = &[
    FieldSchema::optional("security_group_id", FieldKind::String, "ID of the security group to be queried.")
        .conflicts_with(&["name", "project_id"]),
    FieldSchema::optional("name", FieldKind::String, "Name of the security group to be queried.")
        .conflicts_with(&["security_group_id"])
        .length(1, 60),
    FieldSchema::optional("project_id", FieldKind::Int, "Project ID of the security group to be queried. `0` means no project filter.")
        .conflicts_with(&["security_group_id"]),
    FieldSchema::optional("result_output_file", FieldKind::String, "Used to save results."),
    FieldSchema::computed("security_groups", FieldKind::ObjectList, "Information list of security group."),
];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: TYPE_NAME,
    description: "Use this data source to query detailed information of security groups",
    fields: FIELDS,
};

/// Filters of one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "project_unset")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_output_file: Option<String>,
}

/// Zero carries no filter, same as absent
fn project_unset(project_id: &Option<i64>) -> bool {
    !matches!(project_id, Some(p) if *p != 0)
}

impl SecurityGroupsQuery {
    fn security_group_id(&self) -> Option<&str> {
        self.security_group_id.as_deref().filter(|s| !s.is_empty())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }

    fn project_id(&self) -> Option<i64> {
        self.project_id.filter(|p| *p != 0)
    }

    /// Aggregate identity: `securityGroups-[<id>-][<name>-][<project_id>]`
    pub fn identity(&self) -> String {
        let mut id = String::from(ID_PREFIX);
        if let Some(sg_id) = self.security_group_id() {
            id.push_str(sg_id);
            id.push('-');
        }
        if let Some(name) = self.name() {
            id.push_str(name);
            id.push('-');
        }
        if let Some(project_id) = self.project_id() {
            id.push_str(&project_id.to_string());
        }
        id
    }

    fn filter(&self) -> SecurityGroupFilter {
        SecurityGroupFilter {
            security_group_id: self.security_group_id().map(str::to_string),
            name: self.name().map(str::to_string),
            project_id: self.project_id(),
        }
    }
}

/// One security group in the result list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub create_time: String,
    pub be_associate_count: u64,
    pub project_id: i64,
}

/// Query outcome: aggregate identity plus records in vendor order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupsResult {
    pub id: String,
    pub security_groups: Vec<SecurityGroupRecord>,
}

/// The data source itself
pub struct SecurityGroups;

impl SecurityGroups {
    pub fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    /// Run the query; writes `result_output_file` when set
    pub async fn read(&self, provider: &Provider, query: &SecurityGroupsQuery) -> Result<SecurityGroupsResult> {
        let value = serde_json::to_value(query).map_err(|source| ProviderError::InvalidAttributes {
            kind: TYPE_NAME.to_string(),
            source,
        })?;
        SCHEMA.validate(&value)?;

        let span = tracing::info_span!("data_source", kind = TYPE_NAME, log_id = %uuid::Uuid::new_v4());
        self.query(provider, query).instrument(span).await
    }

    async fn query(&self, provider: &Provider, query: &SecurityGroupsQuery) -> Result<SecurityGroupsResult> {
        let filter = query.filter();
        let vpc = provider.vpc();
        let groups = retry_with_timeout(&provider.read_retry, "DescribeSecurityGroups", || {
            vpc.describe_security_groups(&filter)
        })
        .await?;
        tracing::debug!("found {} security groups", groups.len());

        let security_groups: Vec<SecurityGroupRecord> = stream::iter(groups)
            .map(|sg| enrich(provider, sg))
            .buffered(ENRICH_CONCURRENCY)
            .try_collect()
            .await?;

        let result = SecurityGroupsResult {
            id: query.identity(),
            security_groups,
        };

        if let Some(path) = query.result_output_file.as_deref().filter(|p| !p.is_empty()) {
            write_result_output_file(path, &result.security_groups)?;
        }

        Ok(result)
    }
}

/// Attach the association count to one security group
async fn enrich(provider: &Provider, sg: SecurityGroup) -> Result<SecurityGroupRecord> {
    let sg_id = sg.security_group_id.unwrap_or_default();
    let ids = [sg_id.clone()];

    let vpc = provider.vpc();
    let statistics = retry_with_timeout(
        &provider.read_retry,
        "DescribeSecurityGroupAssociationStatistics",
        || vpc.describe_security_group_association_statistics(&ids),
    )
    .await?;

    let be_associate_count = statistics
        .iter()
        .find(|s| s.security_group_id.as_deref() == Some(sg_id.as_str()))
        .map(|s| s.bound_count())
        .unwrap_or(0);

    let raw_project_id = sg.project_id.unwrap_or_default();
    let project_id = raw_project_id.parse::<i64>().map_err(|e| {
        ProviderError::Validation(format!(
            "security group {} project id invalid: {}",
            sg_id, e
        ))
    })?;

    Ok(SecurityGroupRecord {
        id: sg_id,
        name: sg.security_group_name.unwrap_or_default(),
        description: sg.security_group_desc.unwrap_or_default(),
        create_time: sg.created_time.unwrap_or_default(),
        be_associate_count,
        project_id,
    })
}
