//! `tencentcloud_dcdb_security_group`: binds one security group to a set of
//! DCDB instances.
//!
//! Identity is `<instance ids, sorted and comma joined>#<security_group_id>`.
//! Every field forces replacement.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::engine::Resource;
use super::id;
use super::schema::{FieldKind, FieldSchema, ResourceSchema};
use crate::error::{ProviderError, Result};
use crate::provider::Provider;
use crate::retry::retry_with_timeout;
use crate::service::dcdb::DCDB_PRODUCT;
use crate::service::models::SecurityGroupBindingRequest;

pub const TYPE_NAME: &str = "tencentcloud_dcdb_security_group";

/// Separator between instance ids in the first identity segment
const INSTANCE_SEP: char = ',';

const FIELDS: &[FieldSchema] = &[
    FieldSchema::required("product", FieldKind::String, "db type, e.g. `dcdb`.").force_new(),
    FieldSchema::required("security_group_id", FieldKind::String, "security group id.").force_new(),
    FieldSchema::required("instance_ids", FieldKind::StringSet, "list of instance ids.").force_new(),
];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: TYPE_NAME,
    description: "Provides a resource to create a dcdb security group attachment",
    fields: FIELDS,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupConfig {
    pub product: String,
    pub security_group_id: String,
    pub instance_ids: BTreeSet<String>,
}

/// Build the attachment identity
pub fn attachment_id(instance_ids: &BTreeSet<String>, security_group_id: &str) -> String {
    let joined = instance_ids
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");
    id::join(&[&joined, security_group_id])
}

/// Split an attachment identity into instance ids and the security group id
pub fn parse_attachment_id(id: &str) -> Result<(BTreeSet<String>, &str)> {
    let [instances, security_group_id] = id::split::<2>(id)?;
    let instance_ids: BTreeSet<String> = instances
        .split(INSTANCE_SEP)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if instance_ids.is_empty() {
        return Err(ProviderError::BrokenId(id.to_string()));
    }
    Ok((instance_ids, security_group_id))
}

pub struct SecurityGroupAttachment;

impl SecurityGroupAttachment {
    fn binding(product: &str, security_group_id: &str, instance_ids: &BTreeSet<String>) -> SecurityGroupBindingRequest {
        SecurityGroupBindingRequest {
            product: product.to_string(),
            security_group_id: security_group_id.to_string(),
            instance_ids: instance_ids.iter().cloned().collect(),
        }
    }
}

/// Instances to release on delete: those in the identity that the last
/// read still saw bound. An empty prior set (import, old state) releases all.
pub fn bound_instances(from_id: BTreeSet<String>, prior: &BTreeSet<String>) -> BTreeSet<String> {
    if prior.is_empty() {
        return from_id;
    }
    from_id.intersection(prior).cloned().collect()
}

fn product_or_default(product: &str) -> &str {
    if product.is_empty() {
        DCDB_PRODUCT
    } else {
        product
    }
}

#[async_trait]
impl Resource for SecurityGroupAttachment {
    type Config = SecurityGroupConfig;

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, provider: &Provider, config: &SecurityGroupConfig) -> Result<String> {
        let request = Self::binding(&config.product, &config.security_group_id, &config.instance_ids);

        let dcdb = provider.dcdb();
        retry_with_timeout(&provider.write_retry, "AssociateSecurityGroups", || {
            dcdb.associate_security_groups(&request)
        })
        .await?;

        Ok(attachment_id(&config.instance_ids, &config.security_group_id))
    }

    async fn read(
        &self,
        provider: &Provider,
        id: &str,
        prior: &SecurityGroupConfig,
    ) -> Result<Option<SecurityGroupConfig>> {
        let (instance_ids, security_group_id) = parse_attachment_id(id)?;
        let product = product_or_default(&prior.product);

        let dcdb = provider.dcdb();
        let mut bound = BTreeSet::new();
        for instance_id in &instance_ids {
            let groups = match retry_with_timeout(&provider.read_retry, "DescribeDBSecurityGroups", || {
                dcdb.describe_db_security_groups(product, instance_id)
            })
            .await
            {
                Ok(response) => response.groups,
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e),
            };

            if groups
                .iter()
                .any(|g| g.security_group_id.as_deref() == Some(security_group_id))
            {
                bound.insert(instance_id.clone());
            } else {
                tracing::warn!("security group {} no longer bound to {}", security_group_id, instance_id);
            }
        }

        if bound.is_empty() {
            return Ok(None);
        }

        Ok(Some(SecurityGroupConfig {
            product: product.to_string(),
            security_group_id: security_group_id.to_string(),
            instance_ids: bound,
        }))
    }

    async fn update(
        &self,
        _provider: &Provider,
        _id: &str,
        changed: &[&'static str],
        _planned: &SecurityGroupConfig,
    ) -> Result<()> {
        match changed.first() {
            Some(field) => Err(ProviderError::FieldNotUpdatable(field.to_string())),
            None => Ok(()),
        }
    }

    async fn delete(&self, provider: &Provider, id: &str, prior: &SecurityGroupConfig) -> Result<()> {
        let (instance_ids, security_group_id) = parse_attachment_id(id)?;
        let instance_ids = bound_instances(instance_ids, &prior.instance_ids);
        if instance_ids.is_empty() {
            tracing::warn!("security group {} is not bound to any instance of {}", security_group_id, id);
            return Ok(());
        }
        let request = Self::binding(product_or_default(&prior.product), security_group_id, &instance_ids);

        let dcdb = provider.dcdb();
        retry_with_timeout(&provider.write_retry, "DisassociateSecurityGroups", || {
            dcdb.disassociate_security_groups(&request)
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_attachment_id_is_sorted() {
        assert_eq!(attachment_id(&ids(&["dcdbt-2", "dcdbt-1"]), "sg-1"), "dcdbt-1,dcdbt-2#sg-1");
    }

    #[test]
    fn test_bound_instances() {
        let from_id = ids(&["dcdbt-1", "dcdbt-2"]);
        assert_eq!(bound_instances(from_id.clone(), &ids(&["dcdbt-2"])), ids(&["dcdbt-2"]));
        assert_eq!(bound_instances(from_id.clone(), &BTreeSet::new()), from_id);
        assert!(bound_instances(from_id, &ids(&["dcdbt-9"])).is_empty());
    }

    #[test]
    fn test_parse_attachment_id() {
        let (instances, sg) = parse_attachment_id("dcdbt-1,dcdbt-2#sg-1").unwrap();
        assert_eq!(instances, ids(&["dcdbt-1", "dcdbt-2"]));
        assert_eq!(sg, "sg-1");
    }

    #[test]
    fn test_parse_broken_attachment_id() {
        assert!(parse_attachment_id("sg-1").is_err());
        assert!(parse_attachment_id(",#sg-1").is_err());
        assert!(parse_attachment_id("dcdbt-1#").is_err());
    }

    #[test]
    fn test_every_field_forces_new() {
        assert!(SCHEMA
            .fields
            .iter()
            .all(|f| f.mutability == crate::resource::schema::Mutability::ForceNew));
    }
}
