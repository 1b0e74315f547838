//! DCDB (distributed database) actions

use super::invoke;
use super::models::*;
use crate::cloud::client::{CloudClient, Product};
use crate::error::Result;

/// Product code used by the DCDB security-group actions
pub const DCDB_PRODUCT: &str = "dcdb";

/// Thin wrapper over the DCDB API
#[derive(Clone, Copy)]
pub struct DcdbService<'a> {
    client: &'a CloudClient,
}

impl<'a> DcdbService<'a> {
    pub fn new(client: &'a CloudClient) -> Self {
        Self { client }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub async fn create_account(&self, request: &CreateAccountRequest) -> Result<CreateAccountResponse> {
        invoke(self.client, Product::Dcdb, "CreateAccount", request).await
    }

    pub async fn describe_accounts(&self, instance_id: &str) -> Result<DescribeAccountsResponse> {
        let request = DescribeAccountsRequest {
            instance_id: instance_id.to_string(),
        };
        invoke(self.client, Product::Dcdb, "DescribeAccounts", &request).await
    }

    pub async fn modify_account_description(
        &self,
        request: &ModifyAccountDescriptionRequest,
    ) -> Result<EmptyResponse> {
        invoke(self.client, Product::Dcdb, "ModifyAccountDescription", request).await
    }

    pub async fn delete_account(
        &self,
        instance_id: &str,
        user_name: &str,
        host: Option<&str>,
    ) -> Result<EmptyResponse> {
        let request = DeleteAccountRequest {
            instance_id: instance_id.to_string(),
            user_name: user_name.to_string(),
            host: host.map(str::to_string),
        };
        invoke(self.client, Product::Dcdb, "DeleteAccount", &request).await
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// Create a prepaid (monthly) instance
    pub async fn create_dcdb_instance(&self, request: &CreateInstanceRequest) -> Result<CreateInstanceResponse> {
        invoke(self.client, Product::Dcdb, "CreateDCDBInstance", request).await
    }

    /// Create an hourly-billed instance
    pub async fn create_hour_dcdb_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<CreateInstanceResponse> {
        invoke(self.client, Product::Dcdb, "CreateHourDCDBInstance", request).await
    }

    pub async fn describe_dcdb_instances(&self, instance_id: &str) -> Result<DescribeDcdbInstancesResponse> {
        let request = DescribeDcdbInstancesRequest {
            instance_ids: vec![instance_id.to_string()],
        };
        invoke(self.client, Product::Dcdb, "DescribeDCDBInstances", &request).await
    }

    pub async fn modify_db_instance_name(&self, instance_id: &str, instance_name: &str) -> Result<EmptyResponse> {
        let request = ModifyDbInstanceNameRequest {
            instance_id: instance_id.to_string(),
            instance_name: instance_name.to_string(),
        };
        invoke(self.client, Product::Dcdb, "ModifyDBInstanceName", &request).await
    }

    pub async fn destroy_dcdb_instance(&self, instance_id: &str) -> Result<DestroyInstanceResponse> {
        let request = DestroyInstanceRequest {
            instance_id: instance_id.to_string(),
        };
        invoke(self.client, Product::Dcdb, "DestroyDCDBInstance", &request).await
    }

    pub async fn destroy_hour_dcdb_instance(&self, instance_id: &str) -> Result<DestroyInstanceResponse> {
        let request = DestroyInstanceRequest {
            instance_id: instance_id.to_string(),
        };
        invoke(self.client, Product::Dcdb, "DestroyHourDCDBInstance", &request).await
    }

    // =========================================================================
    // Security groups
    // =========================================================================

    pub async fn associate_security_groups(&self, request: &SecurityGroupBindingRequest) -> Result<EmptyResponse> {
        invoke(self.client, Product::Dcdb, "AssociateSecurityGroups", request).await
    }

    pub async fn describe_db_security_groups(
        &self,
        product: &str,
        instance_id: &str,
    ) -> Result<DescribeDbSecurityGroupsResponse> {
        let request = DescribeDbSecurityGroupsRequest {
            product: product.to_string(),
            instance_id: instance_id.to_string(),
        };
        invoke(self.client, Product::Dcdb, "DescribeDBSecurityGroups", &request).await
    }

    pub async fn disassociate_security_groups(
        &self,
        request: &SecurityGroupBindingRequest,
    ) -> Result<EmptyResponse> {
        invoke(self.client, Product::Dcdb, "DisassociateSecurityGroups", request).await
    }
}
