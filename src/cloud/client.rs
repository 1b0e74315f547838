//! Tencent Cloud client
//!
//! Main client for interacting with Tencent Cloud APIs, combining
//! credentials, the HTTP layer and per-action rate limiting.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::auth::Credentials;
use super::http::{ActionHeaders, ApiHttpClient};
use super::ratelimit::RateLimiter;
use crate::error::{ProviderError, Result};

/// Default API domain
pub const DEFAULT_DOMAIN: &str = "tencentcloudapi.com";

/// Vendor product APIs used by this provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    Dcdb,
    Vpc,
}

impl Product {
    /// Host prefix, e.g. `dcdb` in `dcdb.tencentcloudapi.com`
    pub fn host_prefix(self) -> &'static str {
        match self {
            Product::Dcdb => "dcdb",
            Product::Vpc => "vpc",
        }
    }

    /// API version sent in `X-TC-Version`
    pub fn version(self) -> &'static str {
        match self {
            Product::Dcdb => "2018-04-11",
            Product::Vpc => "2017-03-12",
        }
    }
}

/// Main Tencent Cloud client
#[derive(Clone)]
pub struct CloudClient {
    pub credentials: Credentials,
    pub http: ApiHttpClient,
    pub region: String,
    pub limiter: RateLimiter,
    domain: String,
    endpoint: Option<String>,
}

impl CloudClient {
    /// Create a new client for a region
    pub fn new(credentials: Credentials, region: &str) -> Result<Self> {
        Ok(Self {
            credentials,
            http: ApiHttpClient::new()?,
            region: region.to_string(),
            limiter: RateLimiter::default(),
            domain: DEFAULT_DOMAIN.to_string(),
            endpoint: None,
        })
    }

    /// Send every product to one base URL (private gateways, tests)
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    /// Use a different API domain, e.g. `internal.tencentcloudapi.com`
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self
    }

    /// Replace the rate limiter
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Build the endpoint URL for a product
    pub fn product_url(&self, product: Product) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/", endpoint),
            None => format!("https://{}.{}/", product.host_prefix(), self.domain),
        }
    }

    /// Call one vendor action with a typed request and response
    pub async fn call<Req, Resp>(&self, product: Product, action: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_value(request).map_err(|source| ProviderError::Decode {
            action: action.to_string(),
            source,
        })?;

        let headers = ActionHeaders {
            service: product.host_prefix(),
            action,
            version: product.version(),
            region: &self.region,
        };

        let response = self
            .http
            .post_action(
                &self.product_url(product),
                &headers,
                &self.credentials,
                &body,
            )
            .await?;

        serde_json::from_value(response).map_err(|source| ProviderError::Decode {
            action: action.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudClient {
        let creds = Credentials::new("id", "key", None).unwrap();
        CloudClient::new(creds, "ap-guangzhou").unwrap()
    }

    #[test]
    fn test_product_urls() {
        let client = client();
        assert_eq!(
            client.product_url(Product::Dcdb),
            "https://dcdb.tencentcloudapi.com/"
        );
        assert_eq!(
            client.product_url(Product::Vpc),
            "https://vpc.tencentcloudapi.com/"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let client = client().with_endpoint("http://127.0.0.1:9000/");
        assert_eq!(client.product_url(Product::Dcdb), "http://127.0.0.1:9000/");
        assert_eq!(client.product_url(Product::Vpc), "http://127.0.0.1:9000/");
    }

    #[test]
    fn test_domain_override() {
        let client = client().with_domain("internal.tencentcloudapi.com");
        assert_eq!(
            client.product_url(Product::Vpc),
            "https://vpc.internal.tencentcloudapi.com/"
        );
    }

    #[test]
    fn test_versions() {
        assert_eq!(Product::Dcdb.version(), "2018-04-11");
        assert_eq!(Product::Vpc.version(), "2017-03-12");
    }
}
