//! Provider handle
//!
//! Everything an operation needs travels in one explicit, cloneable
//! [`Provider`]: the vendor client, its rate limiter and the retry budgets.

use std::sync::Arc;

use crate::cloud::auth::Credentials;
use crate::cloud::client::CloudClient;
use crate::cloud::ratelimit::RateLimiter;
use crate::config::Config;
use crate::error::{ProviderError, Result};
use crate::resource::{get_handler, ResourceHandler};
use crate::retry::RetryConfig;
use crate::service::{DcdbService, VpcService};

/// Explicit handle passed into every resource and data source operation
#[derive(Clone)]
pub struct Provider {
    pub client: CloudClient,
    pub write_retry: RetryConfig,
    pub read_retry: RetryConfig,
}

impl Provider {
    /// Create a provider with default retry budgets
    pub fn new(client: CloudClient) -> Self {
        Self {
            client,
            write_retry: RetryConfig::write(),
            read_retry: RetryConfig::read(),
        }
    }

    /// Build from resolved configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = Credentials::new(
            config.secret_id.as_deref().unwrap_or_default(),
            config.secret_key.as_deref().unwrap_or_default(),
            config.security_token.as_deref(),
        )?;

        let region = config.effective_region();
        if !crate::cloud::auth::validate_region(&region) {
            return Err(ProviderError::Validation(format!("invalid region `{}`", region)));
        }

        let limiter = RateLimiter::new(config.rate_limit, config.rate_limit_overrides.clone());
        let mut client = CloudClient::new(credentials, &region)?.with_limiter(limiter);
        if let Some(domain) = &config.domain {
            client = client.with_domain(domain);
        }
        if let Some(endpoint) = &config.endpoint {
            client = client.with_endpoint(endpoint);
        }

        Ok(Self::new(client).with_retry(
            RetryConfig::with_timeout(config.write_timeout()),
            RetryConfig::with_timeout(config.read_timeout()),
        ))
    }

    /// Replace both retry budgets
    pub fn with_retry(mut self, write: RetryConfig, read: RetryConfig) -> Self {
        self.write_retry = write;
        self.read_retry = read;
        self
    }

    pub fn dcdb(&self) -> DcdbService<'_> {
        DcdbService::new(&self.client)
    }

    pub fn vpc(&self) -> VpcService<'_> {
        VpcService::new(&self.client)
    }

    /// Handler for a resource type name, e.g. `tencentcloud_dcdb_account`
    pub fn resource(&self, type_name: &str) -> Result<Arc<dyn ResourceHandler>> {
        get_handler(type_name).ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))
    }
}
