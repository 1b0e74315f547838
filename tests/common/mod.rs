//! Shared helpers for the wiremock-backed integration tests

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use tcdb_provider::cloud::auth::Credentials;
use tcdb_provider::cloud::client::CloudClient;
use tcdb_provider::cloud::ratelimit::RateLimiter;
use tcdb_provider::retry::RetryConfig;
use tcdb_provider::Provider;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const SECRET_ID: &str = "AKIDtest";
pub const SECRET_KEY: &str = "secret";

/// Client aimed at the mock server, without rate limiting
pub fn client(server: &MockServer) -> CloudClient {
    let credentials = Credentials::new(SECRET_ID, SECRET_KEY, None).unwrap();
    CloudClient::new(credentials, "ap-guangzhou")
        .unwrap()
        .with_endpoint(&server.uri())
        .with_limiter(RateLimiter::disabled())
}

/// Millisecond retry budgets so failing tests finish quickly
pub fn fast_retry() -> RetryConfig {
    RetryConfig::with_timeout(Duration::from_millis(300)).initial_delay(Duration::from_millis(1))
}

pub fn provider(server: &MockServer) -> Provider {
    Provider::new(client(server)).with_retry(fast_retry(), fast_retry())
}

/// Match one vendor action
pub fn action(name: &str) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("X-TC-Action", name))
}

/// Successful envelope around `body`
pub fn ok(mut body: Value) -> ResponseTemplate {
    body["RequestId"] = json!("req-ok");
    ResponseTemplate::new(200).set_body_json(json!({ "Response": body }))
}

/// Vendor rejection envelope
pub fn api_error(code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "Response": {
            "Error": {"Code": code, "Message": message},
            "RequestId": "req-err"
        }
    }))
}
