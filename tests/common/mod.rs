//! Shared fixtures for the wiremock-backed integration tests

#![allow(dead_code)]

use serde_json::json;
use vcfo_metrics::config::{CredentialsConfig, InstanceConfig};
use vcfo_metrics::MonitoringService;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/suite-api/api/auth/token/acquire";

pub fn instance_config(name: &str, base_url: &str) -> InstanceConfig {
    InstanceConfig {
        name: name.to_string(),
        base_url: base_url.to_string(),
        major_version: Some(9),
        authentication: CredentialsConfig::new("admin", "VMware1!"),
        related_instance_names: None,
    }
}

pub fn service_for(server: &MockServer) -> MonitoringService {
    MonitoringService::from_instances(vec![instance_config("vcfo-1", &server.uri())])
        .expect("service should build")
}

pub fn token_body(token: &str) -> serde_json::Value {
    json!({
        "token": token,
        "validity": 1_700_000_000_000i64,
        "expiresAt": "Tuesday, November 14, 2023 10:13:20 PM UTC",
        "roles": []
    })
}

/// Token endpoint answering `token` for the configured credentials
pub async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_json(json!({"username": "admin", "password": "VMware1!"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token)))
        .expect(expected_calls)
        .mount(server)
        .await;
}
