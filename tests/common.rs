#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use txledger::config::{Config, StoreBackend};
use txledger::metrics::Metrics;
use txledger::routes::create_router;
use txledger::state::AppState;
use txledger::store::MemoryStore;

/// Router wired to an in-memory store, plus handles to inspect side effects.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub metrics: Metrics,
}

pub fn build_app() -> TestApp {
    build_app_with(Config::default())
}

/// Like `build_app`, starting from `config` with the store forced to memory.
pub fn build_app_with(mut config: Config) -> TestApp {
    config.store.backend = StoreBackend::Memory;

    let store = Arc::new(MemoryStore::new(config.store.max_connections));
    let metrics = Metrics::new();
    let state = AppState {
        config: Arc::new(config),
        store: store.clone(),
        metrics: metrics.clone(),
    };

    TestApp {
        router: create_router(state),
        store,
        metrics,
    }
}

impl TestApp {
    /// Sends a request and drains the body, so response metrics are final.
    pub async fn send(&self, request: Request<Body>) -> (Response<()>, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should succeed");
        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        (Response::from_parts(parts, ()), bytes.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (Response<()>, Vec<u8>) {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> (Response<()>, Vec<u8>) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
        )
        .await
    }

    pub fn metrics_text(&self) -> String {
        self.metrics.render().expect("metrics should render")
    }

    /// Value of the first sample named exactly `name` whose labels include
    /// every `key="value"` fragment in `labels`; 0 when absent.
    pub fn sample(&self, name: &str, labels: &[&str]) -> f64 {
        sample(&self.metrics_text(), name, labels).unwrap_or(0.0)
    }
}

pub fn sample(text: &str, name: &str, labels: &[&str]) -> Option<f64> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            let metric = line.split(['{', ' ']).next().unwrap_or("");
            metric == name
        })
        .filter(|line| labels.iter().all(|label| line.contains(label)))
        .find_map(|line| line.rsplit(' ').next()?.parse().ok())
}

pub fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("body should be JSON")
}
