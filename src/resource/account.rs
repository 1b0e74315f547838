//! `tencentcloud_dcdb_account`: a database account inside a DCDB instance.
//!
//! Identity is `<instance_id>#<user_name>`. Only `description` can change in
//! place; the vendor never returns `password`, so it is carried from state.
//! DeleteAccount takes `Host` besides the two identity segments; it is sent
//! from state when known.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::engine::Resource;
use super::id;
use super::non_empty;
use super::schema::{FieldKind, FieldSchema, ResourceSchema};
use crate::error::Result;
use crate::provider::Provider;
use crate::retry::retry_with_timeout;
use crate::service::models::{CreateAccountRequest, ModifyAccountDescriptionRequest};

pub const TYPE_NAME: &str = "tencentcloud_dcdb_account";

const FIELDS: &[FieldSchema] = &[
    FieldSchema::required("instance_id", FieldKind::String, "instance id."),
    FieldSchema::required("user_name", FieldKind::String, "account name."),
    FieldSchema::required("host", FieldKind::String, "db host."),
    FieldSchema::required("password", FieldKind::String, "password.").sensitive(),
    FieldSchema::optional_computed("read_only", FieldKind::Int, "is it a readonly account."),
    FieldSchema::optional("description", FieldKind::String, "description for account.").updatable(),
    FieldSchema::optional_computed("max_user_connections", FieldKind::Int, "max user connections."),
];

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: TYPE_NAME,
    description: "Provides a resource to create a dcdb account",
    fields: FIELDS,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub instance_id: String,
    pub user_name: String,
    pub host: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_user_connections: Option<u64>,
}

pub struct Account;

#[async_trait]
impl Resource for Account {
    type Config = AccountConfig;

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, provider: &Provider, config: &AccountConfig) -> Result<String> {
        let request = CreateAccountRequest {
            instance_id: non_empty(&config.instance_id),
            user_name: non_empty(&config.user_name),
            host: non_empty(&config.host),
            password: non_empty(&config.password),
            read_only: config.read_only,
            description: config.description.as_deref().and_then(non_empty),
            max_user_connections: config.max_user_connections,
        };

        let dcdb = provider.dcdb();
        let response = retry_with_timeout(&provider.write_retry, "CreateAccount", || {
            dcdb.create_account(&request)
        })
        .await?;

        let instance_id = response
            .instance_id
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| config.instance_id.clone());

        Ok(id::join(&[&instance_id, &config.user_name]))
    }

    async fn read(&self, provider: &Provider, id: &str, prior: &AccountConfig) -> Result<Option<AccountConfig>> {
        let [instance_id, user_name] = id::split::<2>(id)?;

        let dcdb = provider.dcdb();
        let accounts = retry_with_timeout(&provider.read_retry, "DescribeAccounts", || {
            dcdb.describe_accounts(instance_id)
        })
        .await?;

        let Some(account) = accounts
            .users
            .into_iter()
            .find(|a| a.user_name.as_deref() == Some(user_name))
        else {
            return Ok(None);
        };

        let mut state = prior.clone();
        state.instance_id = accounts
            .instance_id
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| instance_id.to_string());
        state.user_name = user_name.to_string();
        if let Some(host) = account.host {
            state.host = host;
        }
        if account.read_only.is_some() {
            state.read_only = account.read_only;
        }
        if account.description.is_some() {
            state.description = account.description;
        }
        if account.max_user_connections.is_some() {
            state.max_user_connections = account.max_user_connections;
        }

        Ok(Some(state))
    }

    async fn update(
        &self,
        provider: &Provider,
        id: &str,
        changed: &[&'static str],
        planned: &AccountConfig,
    ) -> Result<()> {
        let [instance_id, user_name] = id::split::<2>(id)?;
        if !changed.contains(&"description") {
            return Ok(());
        }

        let request = ModifyAccountDescriptionRequest {
            instance_id: instance_id.to_string(),
            user_name: user_name.to_string(),
            host: non_empty(&planned.host),
            description: planned.description.clone().unwrap_or_default(),
        };

        let dcdb = provider.dcdb();
        retry_with_timeout(&provider.write_retry, "ModifyAccountDescription", || {
            dcdb.modify_account_description(&request)
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, provider: &Provider, id: &str, prior: &AccountConfig) -> Result<()> {
        let [instance_id, user_name] = id::split::<2>(id)?;
        let host = non_empty(&prior.host);

        let dcdb = provider.dcdb();
        retry_with_timeout(&provider.write_retry, "DeleteAccount", || {
            dcdb.delete_account(instance_id, user_name, host.as_deref())
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_from_document() {
        let config: AccountConfig = serde_json::from_value(json!({
            "instance_id": "dcdbt-1",
            "user_name": "u1",
            "host": "%",
            "password": "pw",
            "read_only": 0
        }))
        .unwrap();
        assert_eq!(config.read_only, Some(0));
        assert!(config.description.is_none());
        assert!(SCHEMA.validate(&serde_json::to_value(&config).unwrap()).is_ok());
    }

    #[test]
    fn test_missing_password_fails_validation() {
        let config = AccountConfig {
            instance_id: "dcdbt-1".into(),
            user_name: "u1".into(),
            host: "%".into(),
            ..Default::default()
        };
        let err = SCHEMA
            .validate(&serde_json::to_value(&config).unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("`password` is required"));
    }

    #[test]
    fn test_vendor_defaults_do_not_change_plan() {
        let desired = serde_json::to_value(AccountConfig {
            instance_id: "dcdbt-1".into(),
            user_name: "u1".into(),
            host: "%".into(),
            password: "pw".into(),
            ..Default::default()
        })
        .unwrap();
        let mut read_back = desired.clone();
        read_back["read_only"] = json!(0);
        read_back["max_user_connections"] = json!(0);

        let plan = SCHEMA.plan(Some(&read_back), &desired);
        assert_eq!(plan.action, crate::resource::schema::PlanAction::NoOp);

        let mut desired = desired;
        desired["read_only"] = json!(1);
        let plan = SCHEMA.plan(Some(&read_back), &desired);
        assert_eq!(plan.action, crate::resource::schema::PlanAction::Reject);
        assert_eq!(plan.rejected, vec!["read_only"]);
    }

    #[test]
    fn test_only_description_is_updatable() {
        let updatable: Vec<_> = SCHEMA
            .fields
            .iter()
            .filter(|f| f.mutability == crate::resource::schema::Mutability::Updatable)
            .map(|f| f.name)
            .collect();
        assert_eq!(updatable, vec!["description"]);
    }
}
