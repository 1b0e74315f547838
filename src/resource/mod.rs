//! Resource abstraction layer
//!
//! Each resource pairs a static schema table with a typed config and four
//! vendor mappings. The generic [`Engine`] drives the lifecycle; the
//! [`registry`] exposes every engine by its type name.
//!
//! # Architecture
//!
//! - [`schema`] - Field tables, validation and plan classification
//! - [`engine`] - Lifecycle driver and the type-erased [`ResourceHandler`]
//! - [`id`] - Composite `<part1>#<part2>` identities
//! - [`account`], [`instance`], [`security_group`] - Vendor mappings
//!
//! # Example
//!
//! ```ignore
//! use tcdb_provider::resource::get_handler;
//!
//! async fn import_account(provider: &Provider) -> Result<StateDocument> {
//!     let handler = get_handler("tencentcloud_dcdb_account").unwrap();
//!     handler.import(provider, "dcdbt-1#u1").await
//! }
//! ```

pub mod account;
pub mod engine;
pub mod id;
pub mod instance;
pub mod registry;
pub mod schema;
pub mod security_group;

pub use engine::{Engine, Resource, ResourceData, ResourceHandler, StateDocument};
pub use registry::{get_handler, resource_types, schemas};

/// `Some` only for non-empty strings, so empty values are never sent
pub(crate) fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
