//! Generic CRUD engine
//!
//! A [`Resource`] only knows how to map its typed config to vendor calls.
//! [`Engine`] owns the lifecycle around those calls: validation against the
//! schema table, identity handling, read-after-write, clearing identity on
//! not-found, and rejecting changes to fields without an update path.
//!
//! State machine: `absent -> creating -> present -> (read refresh) ->
//! deleting -> absent`. No step performs compensating rollback.

use std::fmt::Debug;
use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use super::schema::{Mutability, Plan, PlanAction, ResourceSchema};
use crate::error::{ProviderError, Result};
use crate::provider::Provider;

/// Per-resource mapping between typed config and vendor calls
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Config: Serialize + DeserializeOwned + Clone + Default + Debug + Send + Sync + 'static;

    fn schema(&self) -> &'static ResourceSchema;

    /// Issue the create call and return the new identity
    async fn create(&self, provider: &Provider, config: &Self::Config) -> Result<String>;

    /// Query by identity. `Ok(None)` means the vendor has no such resource.
    /// Fields the vendor does not return keep their value from `prior`.
    async fn read(&self, provider: &Provider, id: &str, prior: &Self::Config) -> Result<Option<Self::Config>>;

    /// Apply changes to updatable fields only
    async fn update(
        &self,
        provider: &Provider,
        id: &str,
        changed: &[&'static str],
        planned: &Self::Config,
    ) -> Result<()>;

    async fn delete(&self, provider: &Provider, id: &str, prior: &Self::Config) -> Result<()>;
}

/// Identity plus attributes; an empty id means the resource is absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData<C> {
    pub id: String,
    pub attributes: C,
}

impl<C> ResourceData<C> {
    pub fn new(id: impl Into<String>, attributes: C) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    pub fn exists(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Logs how long an operation took when dropped
struct Elapsed {
    name: String,
    start: Instant,
}

impl Elapsed {
    fn start(name: String) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }
}

impl Drop for Elapsed {
    fn drop(&mut self) {
        tracing::debug!("[ELAPSED] {} elapsed {} ms", self.name, self.start.elapsed().as_millis());
    }
}

fn span(kind: &str, op: &'static str) -> tracing::Span {
    tracing::info_span!("resource", kind = %kind, op = op, log_id = %uuid::Uuid::new_v4())
}

/// Drives a [`Resource`] through its lifecycle
pub struct Engine<R> {
    resource: R,
}

impl<R: Resource> Engine<R> {
    pub fn new(resource: R) -> Self {
        Self { resource }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.resource.schema()
    }

    fn kind(&self) -> &'static str {
        self.schema().type_name
    }

    fn to_value(&self, config: &R::Config) -> Result<Value> {
        serde_json::to_value(config).map_err(|source| ProviderError::InvalidAttributes {
            kind: self.kind().to_string(),
            source,
        })
    }

    /// Classify the change from `prior` to `desired`
    pub fn plan(&self, prior: Option<&ResourceData<R::Config>>, desired: &R::Config) -> Result<Plan> {
        let desired = self.to_value(desired)?;
        self.schema().validate(&desired)?;

        let prior = match prior.filter(|p| p.exists()) {
            Some(p) => Some(self.to_value(&p.attributes)?),
            None => None,
        };
        Ok(self.schema().plan(prior.as_ref(), &desired))
    }

    /// Create, then read back computed fields
    pub async fn create(&self, provider: &Provider, config: &R::Config) -> Result<ResourceData<R::Config>> {
        self.create_inner(provider, config)
            .instrument(span(self.kind(), "create"))
            .await
    }

    async fn create_inner(&self, provider: &Provider, config: &R::Config) -> Result<ResourceData<R::Config>> {
        let kind = self.kind();
        let _elapsed = Elapsed::start(format!("resource.{}.create", kind));
        self.schema().validate(&self.to_value(config)?)?;

        let id = self.resource.create(provider, config).await.map_err(|e| {
            tracing::error!("[CRITAL] create {} failed, reason:{}", kind, e);
            e
        })?;
        tracing::info!("created {} {}", kind, id);

        let mut state = ResourceData::new(id, config.clone());
        self.refresh(provider, &mut state).await?;
        Ok(state)
    }

    /// Re-query the vendor and overwrite state. On not-found the identity is
    /// cleared and [`ProviderError::NotExists`] is returned.
    pub async fn read(&self, provider: &Provider, state: &mut ResourceData<R::Config>) -> Result<()> {
        let _elapsed = Elapsed::start(format!("resource.{}.read", self.kind()));
        self.refresh(provider, state)
            .instrument(span(self.kind(), "read"))
            .await
    }

    async fn refresh(&self, provider: &Provider, state: &mut ResourceData<R::Config>) -> Result<()> {
        let kind = self.kind();
        if !state.exists() {
            return Err(ProviderError::NotExists {
                kind,
                id: String::new(),
            });
        }

        let found = match self.resource.read(provider, &state.id, &state.attributes).await {
            Ok(found) => found,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        match found {
            Some(attributes) => {
                state.attributes = attributes;
                Ok(())
            }
            None => {
                let id = std::mem::take(&mut state.id);
                tracing::warn!("resource `{}` {} does not exist, removing from state", kind, id);
                Err(ProviderError::NotExists { kind, id })
            }
        }
    }

    /// Apply in-place changes. Any changed field without an update path
    /// fails before a vendor call is made.
    pub async fn update(
        &self,
        provider: &Provider,
        state: &mut ResourceData<R::Config>,
        planned: &R::Config,
    ) -> Result<()> {
        self.update_inner(provider, state, planned)
            .instrument(span(self.kind(), "update"))
            .await
    }

    async fn update_inner(
        &self,
        provider: &Provider,
        state: &mut ResourceData<R::Config>,
        planned: &R::Config,
    ) -> Result<()> {
        let kind = self.kind();
        let _elapsed = Elapsed::start(format!("resource.{}.update", kind));

        let prior = self.to_value(&state.attributes)?;
        let desired = self.to_value(planned)?;
        self.schema().validate(&desired)?;

        let changed = self.schema().changed_fields(&prior, &desired);
        if let Some(field) = changed.iter().find(|f| f.mutability != Mutability::Updatable) {
            return Err(ProviderError::FieldNotUpdatable(field.name.to_string()));
        }

        if !changed.is_empty() {
            let names: Vec<&'static str> = changed.iter().map(|f| f.name).collect();
            self.resource
                .update(provider, &state.id, &names, planned)
                .await
                .map_err(|e| {
                    tracing::error!("[CRITAL] update {} failed, reason:{}", kind, e);
                    e
                })?;
            tracing::info!("updated {} {} fields={:?}", kind, state.id, names);
        }

        state.attributes = planned.clone();
        self.refresh(provider, state).await
    }

    /// Delete and drop local state
    pub async fn delete(&self, provider: &Provider, state: &mut ResourceData<R::Config>) -> Result<()> {
        self.delete_inner(provider, state)
            .instrument(span(self.kind(), "delete"))
            .await
    }

    async fn delete_inner(&self, provider: &Provider, state: &mut ResourceData<R::Config>) -> Result<()> {
        let kind = self.kind();
        let _elapsed = Elapsed::start(format!("resource.{}.delete", kind));
        if !state.exists() {
            return Ok(());
        }

        self.resource.delete(provider, &state.id, &state.attributes).await?;
        tracing::info!("deleted {} {}", kind, state.id);
        state.id.clear();
        Ok(())
    }

    /// Re-hydrate a resource from its identity alone
    pub async fn import(&self, provider: &Provider, id: &str) -> Result<ResourceData<R::Config>> {
        let mut state = ResourceData::new(id, R::Config::default());
        self.read(provider, &mut state).await?;
        Ok(state)
    }

    /// Converge `state` towards `desired`. The prior resource is refreshed
    /// first; one that vanished is treated as absent and created again.
    /// `state` always reflects what exists, also when an error is returned.
    pub async fn apply(
        &self,
        provider: &Provider,
        state: &mut ResourceData<R::Config>,
        desired: &R::Config,
    ) -> Result<()> {
        self.schema().validate(&self.to_value(desired)?)?;

        if state.exists() {
            match self.read(provider, state).await {
                Ok(()) => {}
                Err(ProviderError::NotExists { .. }) => {
                    tracing::info!("{} vanished outside of tcdb, creating it again", self.kind());
                }
                Err(e) => return Err(e),
            }
        }

        let plan = self.plan(Some(&*state), desired)?;
        tracing::debug!("plan for {}: {:?}", self.kind(), plan);

        match plan.action {
            PlanAction::Reject => Err(ProviderError::FieldNotUpdatable(
                plan.rejected.first().copied().unwrap_or_default().to_string(),
            )),
            PlanAction::NoOp => Ok(()),
            PlanAction::Update => self.update(provider, state, desired).await,
            PlanAction::Replace => {
                self.delete(provider, state).await?;
                *state = self.create(provider, desired).await?;
                Ok(())
            }
            PlanAction::Create => {
                *state = self.create(provider, desired).await?;
                Ok(())
            }
        }
    }
}

// =============================================================================
// Type-erased handlers
// =============================================================================

/// Serialized state as stored by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
    pub attributes: Value,
}

impl StateDocument {
    /// Document for a resource that does not exist yet
    pub fn absent(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            id: String::new(),
            attributes: Value::Null,
        }
    }
}

/// Object-safe view of an [`Engine`] working on JSON documents
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn schema(&self) -> &'static ResourceSchema;

    fn plan(&self, prior: Option<&StateDocument>, desired: &Value) -> Result<Plan>;

    /// Converge `state` towards `desired`, rewriting it even on failure
    async fn apply(&self, provider: &Provider, state: &mut StateDocument, desired: &Value) -> Result<()>;

    async fn read(&self, provider: &Provider, state: &mut StateDocument) -> Result<()>;

    async fn import(&self, provider: &Provider, id: &str) -> Result<StateDocument>;

    async fn delete(&self, provider: &Provider, state: &mut StateDocument) -> Result<()>;
}

impl<R: Resource> Engine<R> {
    fn decode(&self, attributes: &Value) -> Result<R::Config> {
        serde_json::from_value(attributes.clone()).map_err(|source| ProviderError::InvalidAttributes {
            kind: self.kind().to_string(),
            source,
        })
    }

    fn decode_state(&self, doc: &StateDocument) -> Result<ResourceData<R::Config>> {
        if doc.type_name != self.kind() {
            return Err(ProviderError::Validation(format!(
                "state is for `{}`, not `{}`",
                doc.type_name,
                self.kind()
            )));
        }
        if doc.id.is_empty() {
            return Ok(ResourceData::new("", R::Config::default()));
        }
        Ok(ResourceData::new(doc.id.clone(), self.decode(&doc.attributes)?))
    }

    fn encode_state(&self, state: &ResourceData<R::Config>) -> Result<StateDocument> {
        Ok(StateDocument {
            type_name: self.kind().to_string(),
            id: state.id.clone(),
            attributes: self.to_value(&state.attributes)?,
        })
    }
}

#[async_trait]
impl<R: Resource> ResourceHandler for Engine<R> {
    fn schema(&self) -> &'static ResourceSchema {
        self.resource.schema()
    }

    fn plan(&self, prior: Option<&StateDocument>, desired: &Value) -> Result<Plan> {
        Engine::schema(self).validate(desired)?;
        let prior = prior.map(|p| self.decode_state(p)).transpose()?;
        Engine::plan(self, prior.as_ref(), &self.decode(desired)?)
    }

    async fn apply(&self, provider: &Provider, doc: &mut StateDocument, desired: &Value) -> Result<()> {
        Engine::schema(self).validate(desired)?;
        let desired = self.decode(desired)?;
        let mut state = self.decode_state(doc)?;
        let result = Engine::apply(self, provider, &mut state, &desired).await;
        *doc = self.encode_state(&state)?;
        result
    }

    async fn read(&self, provider: &Provider, doc: &mut StateDocument) -> Result<()> {
        let mut state = self.decode_state(doc)?;
        let result = Engine::read(self, provider, &mut state).await;
        *doc = self.encode_state(&state)?;
        result
    }

    async fn import(&self, provider: &Provider, id: &str) -> Result<StateDocument> {
        let state = Engine::import(self, provider, id).await?;
        self.encode_state(&state)
    }

    async fn delete(&self, provider: &Provider, doc: &mut StateDocument) -> Result<()> {
        let mut state = self.decode_state(doc)?;
        Engine::delete(self, provider, &mut state).await?;
        doc.id = state.id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::auth::Credentials;
    use crate::cloud::client::CloudClient;
    use crate::resource::schema::{FieldKind, FieldSchema};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Widget {
        name: String,
        label: Option<String>,
        zone: Option<String>,
    }

    const FIELDS: &[FieldSchema] = &[
        FieldSchema::required("name", FieldKind::String, "name."),
        FieldSchema::optional("label", FieldKind::String, "label.").updatable(),
        FieldSchema::optional("zone", FieldKind::String, "zone.").force_new(),
    ];

    const SCHEMA: ResourceSchema = ResourceSchema {
        type_name: "test_widget",
        description: "test",
        fields: FIELDS,
    };

    /// In-memory vendor
    #[derive(Default)]
    struct Widgets {
        store: Mutex<BTreeMap<String, Widget>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Widgets {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Resource for Widgets {
        type Config = Widget;

        fn schema(&self) -> &'static ResourceSchema {
            &SCHEMA
        }

        async fn create(&self, _: &Provider, config: &Widget) -> Result<String> {
            self.record("create");
            let id = format!("w-{}", config.name);
            self.store.lock().unwrap().insert(id.clone(), config.clone());
            Ok(id)
        }

        async fn read(&self, _: &Provider, id: &str, _: &Widget) -> Result<Option<Widget>> {
            self.record("read");
            Ok(self.store.lock().unwrap().get(id).cloned())
        }

        async fn update(&self, _: &Provider, id: &str, _: &[&'static str], planned: &Widget) -> Result<()> {
            self.record("update");
            self.store.lock().unwrap().insert(id.to_string(), planned.clone());
            Ok(())
        }

        async fn delete(&self, _: &Provider, id: &str, _: &Widget) -> Result<()> {
            self.record("delete");
            self.store.lock().unwrap().remove(id);
            Ok(())
        }
    }

    fn provider() -> Provider {
        let credentials = Credentials::new("id", "key", None).unwrap();
        Provider::new(CloudClient::new(credentials, "ap-guangzhou").unwrap())
    }

    fn widget(name: &str, label: Option<&str>, zone: Option<&str>) -> Widget {
        Widget {
            name: name.to_string(),
            label: label.map(str::to_string),
            zone: zone.map(str::to_string),
        }
    }

    fn calls(engine: &Engine<Widgets>) -> Vec<&'static str> {
        engine.resource.calls.lock().unwrap().clone()
    }

    #[test]
    fn test_plan_actions() {
        let engine = Engine::new(Widgets::default());
        let prior = ResourceData::new("w-a", widget("a", None, Some("z1")));

        let plan = |desired: Widget| engine.plan(Some(&prior), &desired).unwrap().action;
        assert_eq!(plan(widget("a", None, Some("z1"))), PlanAction::NoOp);
        assert_eq!(plan(widget("a", Some("x"), Some("z1"))), PlanAction::Update);
        assert_eq!(plan(widget("a", None, Some("z2"))), PlanAction::Replace);
        assert_eq!(plan(widget("b", None, Some("z1"))), PlanAction::Reject);

        let absent = ResourceData::new("", widget("a", None, None));
        let plan = engine.plan(Some(&absent), &widget("a", None, None)).unwrap();
        assert_eq!(plan.action, PlanAction::Create);
    }

    #[test]
    fn test_plan_validates_first() {
        let engine = Engine::new(Widgets::default());
        let err = engine.plan(None, &widget("", None, None)).unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_apply_create_then_update() {
        let engine = Engine::new(Widgets::default());
        let provider = provider();
        let mut state = ResourceData::default();

        engine.apply(&provider, &mut state, &widget("a", None, None)).await.unwrap();
        assert_eq!(state.id, "w-a");

        engine
            .apply(&provider, &mut state, &widget("a", Some("x"), None))
            .await
            .unwrap();
        assert_eq!(state.attributes.label.as_deref(), Some("x"));
        assert_eq!(calls(&engine), vec!["create", "read", "read", "update", "read"]);
    }

    #[tokio::test]
    async fn test_apply_noop_only_refreshes() {
        let engine = Engine::new(Widgets::default());
        let provider = provider();
        let mut state = ResourceData::default();

        engine.apply(&provider, &mut state, &widget("a", None, None)).await.unwrap();
        engine.apply(&provider, &mut state, &widget("a", None, None)).await.unwrap();

        assert_eq!(state.id, "w-a");
        assert_eq!(calls(&engine), vec!["create", "read", "read"]);
    }

    #[tokio::test]
    async fn test_apply_replace_deletes_first() {
        let engine = Engine::new(Widgets::default());
        let provider = provider();
        let mut state = ResourceData::default();

        engine.apply(&provider, &mut state, &widget("a", None, Some("z1"))).await.unwrap();
        engine
            .apply(&provider, &mut state, &widget("a", None, Some("z2")))
            .await
            .unwrap();

        assert_eq!(state.attributes.zone.as_deref(), Some("z2"));
        assert_eq!(calls(&engine), vec!["create", "read", "read", "delete", "create", "read"]);
    }

    #[tokio::test]
    async fn test_apply_recreates_vanished_resource() {
        let engine = Engine::new(Widgets::default());
        let mut state = ResourceData::new("w-a", widget("a", None, None));

        engine
            .apply(&provider(), &mut state, &widget("a", None, None))
            .await
            .unwrap();

        assert_eq!(state.id, "w-a");
        assert_eq!(calls(&engine), vec!["read", "create", "read"]);
    }

    #[tokio::test]
    async fn test_reject_changes_nothing() {
        let engine = Engine::new(Widgets::default());
        let provider = provider();
        let mut state = ResourceData::default();
        engine.apply(&provider, &mut state, &widget("a", None, None)).await.unwrap();

        let err = engine
            .apply(&provider, &mut state, &widget("b", None, None))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::FieldNotUpdatable(ref f) if f == "name"));
        assert_eq!(state.id, "w-a");
        assert_eq!(calls(&engine), vec!["create", "read", "read"]);
    }

    #[tokio::test]
    async fn test_read_missing_clears_id() {
        let engine = Engine::new(Widgets::default());
        let mut state = ResourceData::new("w-gone", widget("gone", None, None));

        let err = engine.read(&provider(), &mut state).await.unwrap_err();

        assert!(matches!(err, ProviderError::NotExists { ref id, .. } if id == "w-gone"));
        assert!(!state.exists());
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let engine = Engine::new(Widgets::default());
        let mut state = ResourceData::new("", Widget::default());

        engine.delete(&provider(), &mut state).await.unwrap();
        assert!(calls(&engine).is_empty());
    }

    #[tokio::test]
    async fn test_handler_rejects_foreign_state() {
        let engine = Engine::new(Widgets::default());
        let doc = StateDocument {
            type_name: "other".to_string(),
            id: "x".to_string(),
            attributes: json!({"name": "a"}),
        };

        let err = ResourceHandler::plan(&engine, Some(&doc), &json!({"name": "a"})).unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_handler_apply_from_absent_document() {
        let engine = Engine::new(Widgets::default());
        let mut doc = StateDocument::absent("test_widget");

        ResourceHandler::apply(&engine, &provider(), &mut doc, &json!({"name": "a", "label": "x"}))
            .await
            .unwrap();

        assert_eq!(doc.id, "w-a");
        assert_eq!(doc.attributes["label"], "x");
    }
}
