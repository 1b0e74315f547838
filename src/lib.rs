//! Declarative provider for Tencent Cloud DCDB instances, accounts and
//! security groups.
//!
//! Resources are driven through a generic CRUD [`resource::Engine`]; the
//! [`provider::Provider`] handle carries the vendor client and retry budgets
//! into every operation.

pub mod cloud;
pub mod config;
pub mod data_source;
pub mod error;
pub mod provider;
pub mod resource;
pub mod retry;
pub mod service;

pub use error::{ProviderError, Result};
pub use provider::Provider;
