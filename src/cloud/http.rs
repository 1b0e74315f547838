//! HTTP utilities for Tencent Cloud API 3.0 calls
//!
//! Every action is a `POST /` carrying the action name, version and region
//! in `X-TC-*` headers and the request object as the JSON body. Responses
//! are wrapped in a `{"Response": {...}}` envelope; vendor failures come
//! back as HTTP 200 with `Response.Error` set.

use reqwest::{Client, Url};
use serde_json::Value;

use super::auth::{Credentials, CONTENT_TYPE};
use crate::error::{ProviderError, Result};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize a body for logging
/// Truncates long bodies and strips control characters
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Headers identifying one vendor action
#[derive(Debug, Clone)]
pub struct ActionHeaders<'a> {
    /// Product host prefix, part of the signature scope
    pub service: &'a str,
    pub action: &'a str,
    pub version: &'a str,
    pub region: &'a str,
}

/// HTTP client wrapper for vendor API calls
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
}

impl ApiHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tcdb-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// POST one action and unwrap the response envelope
    pub async fn post_action(
        &self,
        url: &str,
        headers: &ActionHeaders<'_>,
        credentials: &Credentials,
        body: &Value,
    ) -> Result<Value> {
        tracing::debug!("POST {} action={}", url, headers.action);

        let parsed = Url::parse(url)
            .map_err(|e| ProviderError::Validation(format!("invalid endpoint {}: {}", url, e)))?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ProviderError::Validation(format!("endpoint {} has no host", url))),
        };

        // The signature covers these exact bytes
        let payload = body.to_string();
        let now = chrono::Utc::now();
        let authorization = credentials.authorization(headers.service, &host, &payload, now)?;

        let mut request = self
            .client
            .post(parsed)
            .header("Authorization", authorization)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-TC-Action", headers.action)
            .header("X-TC-Version", headers.version)
            .header("X-TC-Timestamp", now.timestamp().to_string())
            .body(payload);

        if !headers.region.is_empty() {
            request = request.header("X-TC-Region", headers.region);
        }
        if let Some(token) = &credentials.security_token {
            request = request.header("X-TC-Token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(ProviderError::Http {
                status: status.as_u16(),
            });
        }

        let envelope: Value =
            serde_json::from_str(&response_body).map_err(|source| ProviderError::Decode {
                action: headers.action.to_string(),
                source,
            })?;

        unwrap_envelope(headers.action, envelope)
    }
}

/// Extract `Response`, turning `Response.Error` into a vendor error
pub fn unwrap_envelope(action: &str, mut envelope: Value) -> Result<Value> {
    let Some(response) = envelope.get_mut("Response").map(Value::take) else {
        return Err(ProviderError::Decode {
            action: action.to_string(),
            source: serde::de::Error::custom("missing `Response` envelope"),
        });
    };

    if let Some(error) = response.get("Error") {
        let field = |name: &str| {
            error
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        return Err(ProviderError::Api {
            code: field("Code"),
            message: field("Message"),
            request_id: response
                .get("RequestId")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        });
    }

    Ok(response)
}

/// Format a vendor error for display
/// Security: Avoids echoing raw request bodies to the terminal
pub fn format_api_error(error: &ProviderError) -> String {
    match error {
        ProviderError::Api { code, .. } if code.starts_with("AuthFailure") => {
            "Authentication failed. Check TENCENTCLOUD_SECRET_ID / TENCENTCLOUD_SECRET_KEY."
                .to_string()
        }
        ProviderError::Api { code, .. } if code.starts_with("UnauthorizedOperation") => {
            "Permission denied. Check the CAM policy attached to these credentials.".to_string()
        }
        ProviderError::Http { status: 401 } | ProviderError::Http { status: 403 } => {
            "Authentication failed.".to_string()
        }
        ProviderError::Http { status } if *status >= 500 => {
            "Tencent Cloud service temporarily unavailable. Please try again.".to_string()
        }
        ProviderError::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(200)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("a\nb\tc"), "abc");
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
    }

    #[test]
    fn test_unwrap_envelope_success() {
        let envelope = json!({"Response": {"InstanceId": "dcdbt-1", "RequestId": "r-1"}});
        let response = unwrap_envelope("CreateAccount", envelope).unwrap();
        assert_eq!(response["InstanceId"], "dcdbt-1");
    }

    #[test]
    fn test_unwrap_envelope_error() {
        let envelope = json!({"Response": {
            "Error": {"Code": "InvalidParameter", "Message": "bad user"},
            "RequestId": "r-2"
        }});
        match unwrap_envelope("CreateAccount", envelope).unwrap_err() {
            ProviderError::Api {
                code,
                message,
                request_id,
            } => {
                assert_eq!(code, "InvalidParameter");
                assert_eq!(message, "bad user");
                assert_eq!(request_id, "r-2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unwrap_envelope_missing() {
        let err = unwrap_envelope("X", json!({"nope": 1})).unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[test]
    fn test_format_api_error() {
        let auth = ProviderError::Api {
            code: "AuthFailure.SecretIdNotFound".into(),
            message: "".into(),
            request_id: "".into(),
        };
        assert!(format_api_error(&auth).contains("Authentication failed"));
        assert!(format_api_error(&ProviderError::Http { status: 503 }).contains("unavailable"));
        assert_eq!(
            format_api_error(&ProviderError::BrokenId("x".into())),
            "id is broken,x"
        );
    }
}
