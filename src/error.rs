//! Provider error taxonomy
//!
//! Vendor error codes are classified by their `Error.Code` value instead of
//! matching on message text, so the retry loop and the read path can decide
//! what is transient and what means "the resource is gone".

use std::time::Duration;
use thiserror::Error;

/// Result alias used across the library
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

/// Errors surfaced by resources, data sources and the vendor client
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The vendor rejected the request (returned verbatim)
    #[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    /// Non-success HTTP status without a vendor error envelope
    #[error("API request failed: {status}")]
    Http { status: u16 },

    /// Connection, TLS or timeout failure before a response was read
    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("failed to decode {action} response: {source}")]
    Decode {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    /// The vendor accepted a create call but returned no identity
    #[error("{action} returned no instance id")]
    EmptyResponse { action: String },

    /// Resource is still converging (retried by the wait loop)
    #[error("instance {id} is not ready yet (status {status})")]
    NotReady { id: String, status: i64 },

    /// Read found nothing for the identity; local identity has been cleared
    #[error("resource `{kind}` {id} does not exist")]
    NotExists { kind: &'static str, id: String },

    /// Composite identity did not split into the expected parts
    #[error("id is broken,{0}")]
    BrokenId(String),

    /// A field without an update path was changed
    #[error("`{0}` do not support change now.")]
    FieldNotUpdatable(String),

    /// Configuration violates the declared schema
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// Two mutually exclusive fields were set together
    #[error("\"{field}\": conflicts with {other}")]
    Conflict { field: String, other: String },

    /// Attributes could not be mapped onto the typed config
    #[error("invalid attributes for {kind}: {source}")]
    InvalidAttributes {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// Data source results could not be written
    #[error("failed to write {path}: {source}")]
    OutputFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// No resource or data source is registered under the name
    #[error("unknown resource type: {0}")]
    UnknownType(String),

    /// Retry budget exhausted while the last error was still retryable
    #[error("{operation} timed out after {elapsed:?}: {last}")]
    Timeout {
        operation: String,
        elapsed: Duration,
        last: Box<ProviderError>,
    },
}

/// Vendor codes worth retrying (prefix match)
const RETRYABLE_CODES: &[&str] = &[
    "InternalError",
    "RequestLimitExceeded",
    "ResourceInUse",
    "ResourceBusy",
    "ResourceUnavailable",
    "FailedOperation.InstanceStatusError",
];

/// Vendor codes that mean the target does not exist (prefix match)
const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFound",
    "InvalidParameter.NotFound",
    "InvalidParameterValue.NotFound",
    "InvalidInstanceId.NotFound",
];

fn matches_code(code: &str, table: &[&str]) -> bool {
    table.iter().any(|prefix| code.starts_with(prefix))
}

impl ProviderError {
    /// Vendor error code, if this is a vendor rejection
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if this error should be retried inside the bounded retry loop
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Api { code, .. } => matches_code(code, RETRYABLE_CODES),
            ProviderError::Http { status } => *status == 429 || *status >= 500,
            ProviderError::Transport(_) | ProviderError::NotReady { .. } => true,
            _ => false,
        }
    }

    /// Check if this error means the resource is absent
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::Api { code, .. } => matches_code(code, NOT_FOUND_CODES),
            ProviderError::NotExists { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str) -> ProviderError {
        ProviderError::Api {
            code: code.to_string(),
            message: "boom".to_string(),
            request_id: "req-1".to_string(),
        }
    }

    #[test]
    fn test_rate_limit_codes_are_retryable() {
        assert!(api("RequestLimitExceeded").is_retryable());
        assert!(api("RequestLimitExceeded.UinLimitExceeded").is_retryable());
        assert!(api("InternalError.DbOperationFailed").is_retryable());
    }

    #[test]
    fn test_rejections_are_not_retryable() {
        assert!(!api("InvalidParameter").is_retryable());
        assert!(!api("AuthFailure.SignatureFailure").is_retryable());
        assert!(!ProviderError::BrokenId("x".into()).is_retryable());
        assert!(!ProviderError::FieldNotUpdatable("host".into()).is_retryable());
    }

    #[test]
    fn test_http_status_classification() {
        assert!(ProviderError::Http { status: 503 }.is_retryable());
        assert!(ProviderError::Http { status: 429 }.is_retryable());
        assert!(!ProviderError::Http { status: 400 }.is_retryable());
    }

    #[test]
    fn test_not_found_codes() {
        assert!(api("ResourceNotFound.InstanceNotExist").is_not_found());
        assert!(api("InvalidParameter.NotFound").is_not_found());
        assert!(!api("InvalidParameter").is_not_found());
        assert!(!api("InternalError").is_not_found());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ProviderError::FieldNotUpdatable("host".into()).to_string(),
            "`host` do not support change now."
        );
        assert_eq!(
            ProviderError::BrokenId("abc".into()).to_string(),
            "id is broken,abc"
        );
        assert_eq!(api("InvalidParameter").code(), Some("InvalidParameter"));
    }
}
