//! Tencent Cloud credentials
//!
//! Credentials come from the config file, overridden by the standard
//! `TENCENTCLOUD_*` environment variables. Every request is signed with
//! `TC3-HMAC-SHA256`; the secret key never leaves the process.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{ProviderError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm name, first word of the `Authorization` header
pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
/// Content type covered by the signature
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host";

/// Environment variable holding the secret id
pub const ENV_SECRET_ID: &str = "TENCENTCLOUD_SECRET_ID";
/// Environment variable holding the secret key
pub const ENV_SECRET_KEY: &str = "TENCENTCLOUD_SECRET_KEY";
/// Environment variable holding an optional STS session token
pub const ENV_SECURITY_TOKEN: &str = "TENCENTCLOUD_SECURITY_TOKEN";
/// Environment variable holding the default region
pub const ENV_REGION: &str = "TENCENTCLOUD_REGION";

/// API credential pair plus optional session token
#[derive(Clone)]
pub struct Credentials {
    pub secret_id: String,
    secret_key: String,
    pub security_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .field("security_token", &self.security_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    /// Build credentials, rejecting empty values
    pub fn new(secret_id: &str, secret_key: &str, security_token: Option<&str>) -> Result<Self> {
        if secret_id.trim().is_empty() {
            return Err(ProviderError::Validation(format!(
                "secret_id is empty, set {} or secret_id in the config file",
                ENV_SECRET_ID
            )));
        }
        if secret_key.trim().is_empty() {
            return Err(ProviderError::Validation(format!(
                "secret_key is empty, set {} or secret_key in the config file",
                ENV_SECRET_KEY
            )));
        }

        Ok(Self {
            secret_id: secret_id.to_string(),
            secret_key: secret_key.to_string(),
            security_token: security_token
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string()),
        })
    }

    /// Build the `Authorization` header for a `POST /` with `payload` as
    /// the body. `service` is the product host prefix, e.g. `dcdb`.
    pub fn authorization(&self, service: &str, host: &str, payload: &str, now: DateTime<Utc>) -> Result<String> {
        let date = now.format("%Y-%m-%d").to_string();
        let scope = format!("{}/{}/tc3_request", date, service);

        let canonical_request = format!(
            "POST\n/\n\ncontent-type:{}\nhost:{}\n\n{}\n{}",
            CONTENT_TYPE,
            host,
            SIGNED_HEADERS,
            sha256_hex(payload.as_bytes())
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            now.timestamp(),
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let secret_date = hmac_sha256(format!("TC3{}", self.secret_key).as_bytes(), &date)?;
        let secret_service = hmac_sha256(&secret_date, service)?;
        let secret_signing = hmac_sha256(&secret_service, "tc3_request")?;
        let signature = hex::encode(hmac_sha256(&secret_signing, &string_to_sign)?);

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.secret_id, scope, SIGNED_HEADERS, signature
        ))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], message: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ProviderError::Validation(format!("signing key rejected: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Validate a region name such as `ap-guangzhou`
pub fn validate_region(region: &str) -> bool {
    let mut parts = region.split('-');
    let (Some(first), Some(second)) = (parts.next(), parts.next()) else {
        return false;
    };

    !first.is_empty()
        && !second.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Well-known regions, used when the user asks for a listing
pub fn list_regions() -> Vec<String> {
    vec![
        "ap-guangzhou",
        "ap-shanghai",
        "ap-nanjing",
        "ap-beijing",
        "ap-chengdu",
        "ap-chongqing",
        "ap-hongkong",
        "ap-singapore",
        "ap-bangkok",
        "ap-jakarta",
        "ap-seoul",
        "ap-tokyo",
        "ap-mumbai",
        "na-siliconvalley",
        "na-ashburn",
        "eu-frankfurt",
        "sa-saopaulo",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
