//! Resource Registry
//!
//! Maps resource type names to their engine and provides lookup functions
//! for the CLI and the provider handle.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use super::account::Account;
use super::engine::{Engine, ResourceHandler};
use super::instance::DcdbInstance;
use super::schema::ResourceSchema;
use super::security_group::SecurityGroupAttachment;

type Registry = BTreeMap<&'static str, Arc<dyn ResourceHandler>>;

/// Global registry, built on first access
static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn register<H: ResourceHandler + 'static>(registry: &mut Registry, handler: H) {
    registry.insert(handler.schema().type_name, Arc::new(handler));
}

/// Get the resource registry
pub fn get_registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let mut registry = Registry::new();
        register(&mut registry, Engine::new(Account));
        register(&mut registry, Engine::new(DcdbInstance::prepaid()));
        register(&mut registry, Engine::new(DcdbInstance::hourly()));
        register(&mut registry, Engine::new(SecurityGroupAttachment));
        registry
    })
}

/// Get a handler by type name
pub fn get_handler(type_name: &str) -> Option<Arc<dyn ResourceHandler>> {
    get_registry().get(type_name).cloned()
}

/// All registered type names, sorted
pub fn resource_types() -> Vec<&'static str> {
    get_registry().keys().copied().collect()
}

/// Schemas of every registered resource
pub fn schemas() -> Vec<&'static ResourceSchema> {
    get_registry().values().map(|h| h.schema()).collect()
}
