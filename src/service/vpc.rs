//! VPC security group actions

use super::invoke;
use super::models::*;
use crate::cloud::client::{CloudClient, Product};
use crate::error::Result;

/// Page size for DescribeSecurityGroups
const PAGE_LIMIT: usize = 100;

/// Thin wrapper over the VPC API
#[derive(Clone, Copy)]
pub struct VpcService<'a> {
    client: &'a CloudClient,
}

/// Filters accepted by [`VpcService::describe_security_groups`]
#[derive(Debug, Clone, Default)]
pub struct SecurityGroupFilter {
    pub security_group_id: Option<String>,
    pub name: Option<String>,
    pub project_id: Option<i64>,
}

impl SecurityGroupFilter {
    fn to_request(&self, offset: usize) -> DescribeSecurityGroupsRequest {
        let mut filters = Vec::new();
        if let Some(name) = &self.name {
            filters.push(Filter::new("security-group-name", vec![name.clone()]));
        }
        if let Some(project_id) = self.project_id {
            filters.push(Filter::new("project-id", vec![project_id.to_string()]));
        }

        DescribeSecurityGroupsRequest {
            security_group_ids: self.security_group_id.iter().cloned().collect(),
            filters,
            offset: offset.to_string(),
            limit: PAGE_LIMIT.to_string(),
        }
    }
}

impl<'a> VpcService<'a> {
    pub fn new(client: &'a CloudClient) -> Self {
        Self { client }
    }

    /// Fetch one page of security groups
    pub async fn describe_security_groups_page(
        &self,
        filter: &SecurityGroupFilter,
        offset: usize,
    ) -> Result<DescribeSecurityGroupsResponse> {
        let request = filter.to_request(offset);
        invoke(self.client, Product::Vpc, "DescribeSecurityGroups", &request).await
    }

    /// Fetch all security groups matching the filter (auto-paginate)
    pub async fn describe_security_groups(&self, filter: &SecurityGroupFilter) -> Result<Vec<SecurityGroup>> {
        let mut all_items = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.describe_security_groups_page(filter, offset).await?;
            let fetched = page.security_group_set.len();
            all_items.extend(page.security_group_set);

            if fetched < PAGE_LIMIT {
                break;
            }
            offset += fetched;
        }

        Ok(all_items)
    }

    pub async fn describe_security_group_association_statistics(
        &self,
        security_group_ids: &[String],
    ) -> Result<Vec<SecurityGroupAssociationStatistics>> {
        let request = DescribeSecurityGroupAssociationStatisticsRequest {
            security_group_ids: security_group_ids.to_vec(),
        };
        let response: DescribeSecurityGroupAssociationStatisticsResponse = invoke(
            self.client,
            Product::Vpc,
            "DescribeSecurityGroupAssociationStatistics",
            &request,
        )
        .await?;
        Ok(response.security_group_association_statistics_set)
    }
}
