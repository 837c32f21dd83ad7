//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use texpng::server::{build_router, AppState};
use texpng::services::RenderService;

use super::fake_tools::FakeToolchain;

/// Test application with router and the fake toolchain behind it
pub struct TestApp {
    router: axum::Router,
    pub tools: FakeToolchain,
}

impl TestApp {
    /// Create a new test application backed by fake pdflatex/gs scripts
    pub fn new() -> Self {
        let tools = FakeToolchain::new();
        let router = build_router(Self::create_state(&tools));

        Self { router, tools }
    }

    /// Create state for custom router configuration
    pub fn create_state(tools: &FakeToolchain) -> AppState {
        let renderer = RenderService::with_toolchain(tools.toolchain.clone(), &tools.config());
        AppState {
            renderer: Arc::new(renderer),
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &str) -> TestResponse {
        self.request(json_request(path, body)).await
    }

    /// Make a POST request without any Content-Type header
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::post(path)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// POST a render request built from a JSON value
    pub async fn render(&self, body: serde_json::Value) -> TestResponse {
        self.post_json("/render", &body.to_string()).await
    }

    /// Router clone for driving requests from spawned tasks
    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        send(self.router.clone(), request).await
    }
}

/// Build a JSON POST request
pub fn json_request(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request to a router and collect the response
pub async fn send(router: axum::Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.expect("Request failed");

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
