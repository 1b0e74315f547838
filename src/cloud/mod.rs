//! Tencent Cloud API interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - credentials and region validation
//! - [`client`] - main client for making API 3.0 action calls
//! - [`http`] - HTTP transport and response envelope handling
//! - [`ratelimit`] - per-action request pacing
//!
//! # Example
//!
//! ```ignore
//! use tcdb_provider::cloud::{auth::Credentials, client::{CloudClient, Product}};
//!
//! async fn example() -> tcdb_provider::error::Result<()> {
//!     let client = CloudClient::new(Credentials::new("AKID...", "...", None)?, "ap-guangzhou")?;
//!     let accounts: serde_json::Value = client
//!         .call(Product::Dcdb, "DescribeAccounts", &serde_json::json!({"InstanceId": "dcdbt-1"}))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod ratelimit;
