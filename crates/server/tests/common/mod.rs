//! Common test utilities for API testing.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by a seeded SQLite database in a temporary directory.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use mesa_core::{
    create_authenticator, seed_defaults, ApiKeyEntry, AuthConfig, AuthMethod, Config, Database,
    DatabaseConfig, RunFormat, ServerConfig, SqliteReferenceStore, ValidationConfig,
};
use mesa_server::state::AppState;

/// API key accepted by fixtures built with [`TestConfig::with_api_key`].
pub const TEST_API_KEY: &str = "test-key";

/// User the test API key authenticates as.
pub const TEST_USER: &str = "helpdesk";

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_run_validation() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/run/validate", json!({
///         "value": "123456785"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state, for reaching the stores directly
    pub state: Arc<AppState>,
    /// API key sent with every request, if auth is enabled
    pub api_key: Option<String>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture without authentication.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let auth = if test_config.api_key {
            AuthConfig {
                method: AuthMethod::ApiKey,
                api_keys: vec![ApiKeyEntry {
                    user: TEST_USER.to_string(),
                    key: TEST_API_KEY.to_string(),
                }],
            }
        } else {
            AuthConfig {
                method: AuthMethod::None,
                api_keys: Vec::new(),
            }
        };

        let config = Config {
            auth,
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            validation: ValidationConfig {
                run_format: test_config.run_format,
            },
        };

        let db = Database::open(&db_path).expect("Failed to open database");
        seed_defaults(&SqliteReferenceStore::new(db.clone())).expect("Failed to seed");

        let authenticator =
            Arc::from(create_authenticator(&config.auth).expect("Failed to create authenticator"));
        let api_key = test_config.api_key.then(|| TEST_API_KEY.to_string());

        let state = Arc::new(
            AppState::with_database(config, authenticator, db).expect("Failed to build state"),
        );
        let router = mesa_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            api_key,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PATCH request with JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.request("PATCH", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request without the fixture's API key.
    pub async fn get_unauthenticated(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Register a collaborator and return its ID.
    pub async fn create_collaborator(&self, run: &str, email: &str) -> String {
        let response = self
            .post(
                "/api/v1/collaborators",
                json!({
                    "run": run,
                    "email": email,
                    "first_name": "Ana",
                    "paternal_surname": "Rojas",
                    "maternal_surname": "Soto",
                    "birth_date": "1990-05-01",
                    "hire_date": "2020-01-02"
                }),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "collaborator creation failed: {}",
            response.body
        );
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Create a reference item through the API and return its ID.
    pub async fn create_reference(&self, kind: &str, name: &str) -> i64 {
        let response = self
            .post(&format!("/api/v1/reference/{}", kind), json!({ "name": name }))
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "reference creation failed: {}",
            response.body
        );
        response.body["id"].as_i64().unwrap()
    }

    /// ID of a seeded reference item by kind and name.
    pub fn reference_id(&self, kind: &str, name: &str) -> i64 {
        let kind = kind.parse().unwrap();
        self.state
            .reference_cache()
            .find_by_name(kind, name)
            .unwrap_or_else(|| panic!("no {} named {}", kind, name))
            .id
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(ref key) = self.api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", key));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Require the API key on protected routes
    pub api_key: bool,
    pub run_format: RunFormat,
}

impl TestConfig {
    /// Create config with API key authentication enabled.
    pub fn with_api_key() -> Self {
        Self {
            api_key: true,
            ..Default::default()
        }
    }

    /// Create config accepting formatted RUNs.
    pub fn permissive() -> Self {
        Self {
            run_format: RunFormat::Permissive,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
