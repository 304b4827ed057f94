//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock collaborators injected, so the whole HTTP surface can be
//! exercised without yt-dlp or network access.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vidfetch_core::{
    testing::{MockExtractor, MockMetadataFetcher},
    Config, Extractor, JobOrchestrator, JobRegistry, MetadataFetcher, OrchestratorConfig,
    RetentionConfig, RetentionManager, UrlPolicy,
};
use vidfetch_server::{create_router, AppState};

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use vidfetch_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/jobs", json!({
///         "url": "https://www.facebook.com/watch/?v=1"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock extractor - script per-URL outcomes
    pub extractor: Arc<MockExtractor>,
    /// Mock metadata fetcher - configure the descriptor
    pub metadata: Arc<MockMetadataFetcher>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub retention: Arc<RetentionManager>,
    /// Temporary scratch directory
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with the raw body and headers (file downloads).
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let scratch_dir = temp_dir.path().to_path_buf();

        let extractor = Arc::new(MockExtractor::new());
        let metadata = Arc::new(MockMetadataFetcher::new());

        let config = Config {
            orchestrator: OrchestratorConfig {
                max_concurrent_jobs: test_config.max_concurrent_jobs,
                ..Default::default()
            },
            retention: RetentionConfig {
                scratch_dir: scratch_dir.clone(),
                serve_grace_ms: test_config.serve_grace_ms,
                ..Default::default()
            },
            ..Default::default()
        };

        let retention = Arc::new(RetentionManager::new(config.retention.clone()));
        retention.start().await;

        let orchestrator = Arc::new(JobOrchestrator::new(
            config.orchestrator.clone(),
            scratch_dir,
            UrlPolicy::new(&config.urls),
            Arc::new(JobRegistry::new()),
            Arc::clone(&metadata) as Arc<dyn MetadataFetcher>,
            Arc::clone(&extractor) as Arc<dyn Extractor>,
        ));

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&orchestrator),
            Arc::clone(&retention),
        ));
        let router = create_router(state);

        Self {
            router,
            extractor,
            metadata,
            orchestrator,
            retention,
            temp_dir,
        }
    }

    /// Scratch directory the orchestrator writes into.
    #[allow(dead_code)]
    pub fn scratch_dir(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    #[allow(dead_code)]
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    #[allow(dead_code)]
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.body),
        }
    }

    /// Send a GET request and keep the raw body and headers.
    #[allow(dead_code)]
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Submit a job and return its id.
    #[allow(dead_code)]
    pub async fn submit(&self, url: &str) -> String {
        let response = self
            .post("/api/v1/jobs", serde_json::json!({ "url": url }))
            .await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Poll a job over HTTP until it reaches `completed` or `error`.
    #[allow(dead_code)]
    pub async fn wait_for_terminal(&self, id: &str, timeout: Duration) -> Value {
        let start = std::time::Instant::now();
        loop {
            let response = self.get(&format!("/api/v1/jobs/{}", id)).await;
            let status = response.body["status"].as_str().unwrap_or_default();
            if status == "completed" || status == "error" {
                return response.body;
            }
            assert!(
                start.elapsed() < timeout,
                "job {} did not finish, last seen: {}",
                id,
                response.body
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let raw = self.send(request_builder.body(body).unwrap()).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.body),
        }
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            headers,
            body,
        }
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub max_concurrent_jobs: usize,
    /// Delay between serving a file and removing it
    pub serve_grace_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            serve_grace_ms: 100,
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
