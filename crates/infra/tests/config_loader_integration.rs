//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! building a working client from it.

use std::time::Duration;

use graphdb_domain::{AuthMode, GraphDbError};
use graphdb_infra::{config, repository_client};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_load_config_from_toml_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("graphdb.toml");
    std::fs::write(
        &path,
        r#"
endpoints = [
    "http://node-a:7200/repositories/prod",
    "http://node-b:7200/repositories/prod",
]
username = "admin"
password = "root"
auth_mode = "basic"
retry_count = 2
read_timeout_ms = 5000
"#,
    )
    .expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("Failed to load TOML config");

    assert_eq!(config.endpoints.len(), 2);
    assert_eq!(config.client.auth_mode, AuthMode::Basic);
    assert_eq!(config.client.retry_count, 2);
    assert_eq!(config.client.read_timeout, Duration::from_secs(5));
    let endpoints = config.endpoint_set().expect("endpoints");
    let roots: Vec<String> = endpoints.server_roots().iter().map(ToString::to_string).collect();
    assert_eq!(roots, vec!["http://node-a:7200/", "http://node-b:7200/"]);
}

#[test]
fn test_load_config_with_empty_endpoint_list() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("graphdb.json");
    std::fs::write(&path, r#"{"endpoints": []}"#).expect("Failed to write config");

    let result = config::load_from_file(Some(path));

    assert!(matches!(result, Err(GraphDbError::Config(_))));
}

#[tokio::test]
async fn test_loaded_config_drives_basic_auth_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/security/users/admin"))
        .and(header("Authorization", "Basic YWRtaW46cm9vdA=="))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"username":"admin"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repositories/test/size"))
        .and(header("Authorization", "Basic YWRtaW46cm9vdA=="))
        .respond_with(ResponseTemplate::new(200).set_body_string("5"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("graphdb.json");
    let contents = format!(
        r#"{{"endpoints": ["{}/repositories/test"], "username": "admin", "password": "root", "auth_mode": "basic"}}"#,
        server.uri()
    );
    std::fs::write(&path, contents).expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("Failed to load JSON config");
    let client = repository_client(&config).expect("client");

    assert_eq!(client.get_size(None).await.unwrap(), 5);
    assert_eq!(client.get_size(None).await.unwrap(), 5);
}
