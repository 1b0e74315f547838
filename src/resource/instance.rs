//! `tencentcloud_dcdb_db_instance` and `tencentcloud_dcdb_hourdb_instance`
//!
//! Both resources share one config shape and one mapping; they differ in the
//! create/destroy actions and in `period`, which only prepaid instances take.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::engine::Resource;
use super::non_empty;
use super::schema::{FieldKind, FieldSchema, ResourceSchema};
use crate::error::{ProviderError, Result};
use crate::provider::Provider;
use crate::retry::retry_with_timeout;
use crate::service::models::{CreateInstanceRequest, DcdbInstanceInfo, ResourceTag};

pub const DB_INSTANCE_TYPE: &str = "tencentcloud_dcdb_db_instance";
pub const HOURDB_INSTANCE_TYPE: &str = "tencentcloud_dcdb_hourdb_instance";

/// Instance status once it accepts connections
pub const STATUS_RUNNING: i64 = 2;
/// Instance status after it has been destroyed
pub const STATUS_DELETED: i64 = -2;

macro_rules! instance_fields {
    ($($extra:expr),* $(,)?) => {
        &[
            FieldSchema::required("zones", FieldKind::StringSet, "available zone of shard. The first is the master zone."),
            $($extra,)*
            FieldSchema::required("shard_memory", FieldKind::Int, "memory(GB) for each shard."),
            FieldSchema::required("shard_storage", FieldKind::Int, "storage(GB) for each shard."),
            FieldSchema::required("shard_node_count", FieldKind::Int, "node count for each shard."),
            FieldSchema::required("shard_count", FieldKind::Int, "instance shard count."),
            FieldSchema::optional_computed("vpc_id", FieldKind::String, "vpc id."),
            FieldSchema::optional_computed("subnet_id", FieldKind::String, "subnet id, it's required when vpcId is set."),
            FieldSchema::optional_computed("db_version_id", FieldKind::String, "db engine version, default to 0."),
            FieldSchema::optional("security_group_id", FieldKind::String, "security group id."),
            FieldSchema::optional_computed("project_id", FieldKind::Int, "project id."),
            FieldSchema::optional_computed("instance_name", FieldKind::String, "name of this instance.").updatable(),
            FieldSchema::optional("resource_tags", FieldKind::TagList, "resource tags."),
        ]
    };
}

const DB_INSTANCE_FIELDS: &[FieldSchema] = instance_fields!(FieldSchema::required(
    "period",
    FieldKind::Int,
    "the length of time you want to buy, in months."
));

const HOURDB_INSTANCE_FIELDS: &[FieldSchema] = instance_fields!();

pub static DB_INSTANCE_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: DB_INSTANCE_TYPE,
    description: "Provides a resource to create a dcdb db instance",
    fields: DB_INSTANCE_FIELDS,
};

pub static HOURDB_INSTANCE_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: HOURDB_INSTANCE_TYPE,
    description: "Provides a resource to create a dcdb hourdb instance",
    fields: HOURDB_INSTANCE_FIELDS,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_value: Option<String>,
}

impl From<&Tag> for ResourceTag {
    fn from(tag: &Tag) -> Self {
        Self {
            tag_key: tag.tag_key.clone(),
            tag_value: tag.tag_value.clone(),
        }
    }
}

impl From<ResourceTag> for Tag {
    fn from(tag: ResourceTag) -> Self {
        Self {
            tag_key: tag.tag_key,
            tag_value: tag.tag_value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub zones: BTreeSet<String>,
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
    pub resource_tags: Vec<Tag>,
}

impl InstanceConfig {
    fn to_request(&self, billing: Billing) -> CreateInstanceRequest {
        let opt = |v: &Option<String>| v.as_deref().and_then(non_empty);

        CreateInstanceRequest {
            zones: self.zones.iter().cloned().collect(),
            period: match billing {
                Billing::Prepaid => self.period,
                Billing::Hourly => None,
            },
            shard_memory: self.shard_memory,
            shard_storage: self.shard_storage,
            shard_node_count: self.shard_node_count,
            shard_count: self.shard_count,
            vpc_id: opt(&self.vpc_id),
            subnet_id: opt(&self.subnet_id),
            db_version_id: opt(&self.db_version_id),
            security_group_id: opt(&self.security_group_id),
            project_id: self.project_id,
            instance_name: opt(&self.instance_name),
            resource_tags: self.resource_tags.iter().map(ResourceTag::from).collect(),
        }
    }

    /// Overwrite state with what the vendor reports
    fn merge(&mut self, info: DcdbInstanceInfo) {
        if let Some(zone) = info.zone.filter(|z| !z.is_empty()) {
            // only the master zone is reported
            if !self.zones.contains(&zone) {
                self.zones = BTreeSet::from([zone]);
            }
        }
        if info.memory.is_some() {
            self.shard_memory = info.memory;
        }
        if info.storage.is_some() {
            self.shard_storage = info.storage;
        }
        if info.shard_count.is_some() {
            self.shard_count = info.shard_count;
        }
        if info.node_count.is_some() {
            self.shard_node_count = info.node_count;
        }
        if info.unique_vpc_id.is_some() {
            self.vpc_id = info.unique_vpc_id;
        }
        if info.unique_subnet_id.is_some() {
            self.subnet_id = info.unique_subnet_id;
        }
        if info.db_version_id.is_some() {
            self.db_version_id = info.db_version_id;
        }
        if info.project_id.is_some() {
            self.project_id = info.project_id;
        }
        if info.instance_name.is_some() {
            self.instance_name = info.instance_name;
        }
        if let Some(tags) = info.resource_tags {
            self.resource_tags = tags.into_iter().map(Tag::from).collect();
        }
    }
}

/// How an instance is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Billing {
    Prepaid,
    Hourly,
}

pub struct DcdbInstance {
    billing: Billing,
}

impl DcdbInstance {
    pub fn prepaid() -> Self {
        Self {
            billing: Billing::Prepaid,
        }
    }

    pub fn hourly() -> Self {
        Self {
            billing: Billing::Hourly,
        }
    }

    /// Poll until the new instance reports running
    async fn wait_running(&self, provider: &Provider, instance_id: &str) -> Result<()> {
        let dcdb = provider.dcdb();
        retry_with_timeout(&provider.read_retry, "DescribeDCDBInstances", || async move {
            let response = dcdb.describe_dcdb_instances(instance_id).await?;
            let status = response
                .instances
                .first()
                .and_then(|i| i.status)
                .unwrap_or(-1);

            if status == STATUS_RUNNING {
                Ok(())
            } else {
                tracing::debug!("instance {} status {}, waiting", instance_id, status);
                Err(ProviderError::NotReady {
                    id: instance_id.to_string(),
                    status,
                })
            }
        })
        .await
    }
}

#[async_trait]
impl Resource for DcdbInstance {
    type Config = InstanceConfig;

    fn schema(&self) -> &'static ResourceSchema {
        match self.billing {
            Billing::Prepaid => &DB_INSTANCE_SCHEMA,
            Billing::Hourly => &HOURDB_INSTANCE_SCHEMA,
        }
    }

    async fn create(&self, provider: &Provider, config: &InstanceConfig) -> Result<String> {
        let request = config.to_request(self.billing);
        let dcdb = provider.dcdb();

        let (action, response) = match self.billing {
            Billing::Prepaid => (
                "CreateDCDBInstance",
                retry_with_timeout(&provider.write_retry, "CreateDCDBInstance", || {
                    dcdb.create_dcdb_instance(&request)
                })
                .await?,
            ),
            Billing::Hourly => (
                "CreateHourDCDBInstance",
                retry_with_timeout(&provider.write_retry, "CreateHourDCDBInstance", || {
                    dcdb.create_hour_dcdb_instance(&request)
                })
                .await?,
            ),
        };

        let instance_id = response
            .instance_ids
            .into_iter()
            .find(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                action: action.to_string(),
            })?;

        self.wait_running(provider, &instance_id).await?;
        Ok(instance_id)
    }

    async fn read(&self, provider: &Provider, id: &str, prior: &InstanceConfig) -> Result<Option<InstanceConfig>> {
        let dcdb = provider.dcdb();
        let response = retry_with_timeout(&provider.read_retry, "DescribeDCDBInstances", || {
            dcdb.describe_dcdb_instances(id)
        })
        .await?;

        let Some(info) = response.instances.into_iter().next() else {
            return Ok(None);
        };
        if info.status == Some(STATUS_DELETED) {
            return Ok(None);
        }

        let mut state = prior.clone();
        state.merge(info);
        Ok(Some(state))
    }

    async fn update(
        &self,
        provider: &Provider,
        id: &str,
        changed: &[&'static str],
        planned: &InstanceConfig,
    ) -> Result<()> {
        if !changed.contains(&"instance_name") {
            return Ok(());
        }
        let name = planned.instance_name.clone().unwrap_or_default();

        let dcdb = provider.dcdb();
        retry_with_timeout(&provider.write_retry, "ModifyDBInstanceName", || {
            dcdb.modify_db_instance_name(id, &name)
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, provider: &Provider, id: &str, _prior: &InstanceConfig) -> Result<()> {
        let dcdb = provider.dcdb();
        match self.billing {
            Billing::Prepaid => {
                retry_with_timeout(&provider.write_retry, "DestroyDCDBInstance", || {
                    dcdb.destroy_dcdb_instance(id)
                })
                .await?;
            }
            Billing::Hourly => {
                retry_with_timeout(&provider.write_retry, "DestroyHourDCDBInstance", || {
                    dcdb.destroy_hour_dcdb_instance(id)
                })
                .await?;
            }
        }
        Ok(())
    }
}
