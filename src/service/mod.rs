//! Service layer
//!
//! One thin method per vendor action. Each method builds the request,
//! waits on the rate limiter, performs the call and logs the outcome.
//! Errors are returned unchanged; retrying is the caller's job.

pub mod dcdb;
pub mod models;
pub mod vpc;

pub use dcdb::DcdbService;
pub use vpc::VpcService;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cloud::client::{CloudClient, Product};
use crate::cloud::http::sanitize_for_log;
use crate::error::Result;

/// Request keys never written to logs
const REDACTED_KEYS: &[&str] = &["Password"];

/// Render a request body for logging with secrets masked
fn log_body<T: Serialize>(request: &T) -> String {
    let mut value = serde_json::to_value(request).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        for key in REDACTED_KEYS {
            if let Some(v) = map.get_mut(*key) {
                *v = Value::String("***".to_string());
            }
        }
    }
    sanitize_for_log(&value.to_string())
}

/// Rate-limit, call and log one vendor action
async fn invoke<Req, Resp>(
    client: &CloudClient,
    product: Product,
    action: &str,
    request: &Req,
) -> Result<Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    client.limiter.check(action).await;

    match client.call::<Req, Resp>(product, action, request).await {
        Ok(response) => {
            tracing::debug!(
                "api[{}] success, request body [{}]",
                action,
                log_body(request)
            );
            Ok(response)
        }
        Err(e) => {
            tracing::error!(
                "api[{}] fail, request body [{}], reason[{}]",
                action,
                log_body(request),
                e
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::models::CreateAccountRequest;

    #[test]
    fn test_log_body_masks_password() {
        let request = CreateAccountRequest {
            user_name: Some("u1".into()),
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let logged = log_body(&request);
        assert!(logged.contains("u1"));
        assert!(!logged.contains("hunter2"));
        assert!(logged.contains("***"));
    }
}
