//! Shared test utilities for yakulint integration tests.
//!
//! Provides reusable builders for application state, the router, and the
//! worker pool so test files stay focused on behavior.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use yakulint::api::{create_router, AppState};
use yakulint::config::{QueueConfig, WorkerConfig, YakulintConfig};
use yakulint::dictionary::StaticDictionary;
use yakulint::gateway::{Gateway, MockBackend, ProviderBackend};
use yakulint::pipeline::{start_workers, CheckQueue, WorkerContext};
use yakulint::realtime::CheckEvents;
use yakulint::store::{Check, CheckStore, Directory, MemoryCheckStore, MemoryDirectory};

/// Everything an integration test needs to drive the service.
pub struct TestHarness {
    pub app: Router,
    pub state: Arc<AppState>,
    pub ctx: Arc<WorkerContext>,
    pub store: Arc<MemoryCheckStore>,
}

/// Builder over the harness collaborators.
pub struct HarnessBuilder {
    backend: Arc<dyn ProviderBackend>,
    directory: Arc<dyn Directory>,
    queue_config: QueueConfig,
    worker_config: WorkerConfig,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            backend: Arc::new(MockBackend::compliance_demo()),
            directory: Arc::new(MemoryDirectory::permissive()),
            queue_config: QueueConfig::default(),
            worker_config: WorkerConfig::default(),
        }
    }
}

impl HarnessBuilder {
    pub fn with_backend(mut self, backend: Arc<dyn ProviderBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_queue_config(mut self, config: QueueConfig) -> Self {
        self.queue_config = config;
        self
    }

    pub fn with_worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker_config = config;
        self
    }

    pub fn build(self) -> TestHarness {
        let store = Arc::new(MemoryCheckStore::new());
        let gateway = Arc::new(Gateway::new(
            self.backend.clone(),
            self.backend,
            "mock-chat".to_string(),
            "mock-embedding".to_string(),
            8,
        ));
        let queue = Arc::new(CheckQueue::new(self.queue_config.clone()));
        let events = CheckEvents::new();

        let mut config = YakulintConfig::default();
        config.queue = self.queue_config;
        config.worker = self.worker_config.clone();

        let ctx = Arc::new(WorkerContext {
            store: store.clone() as Arc<dyn CheckStore>,
            dictionary: Arc::new(StaticDictionary::new()),
            gateway: gateway.clone(),
            events: events.clone(),
            queue: queue.clone(),
            config: self.worker_config,
        });

        let state = Arc::new(AppState::new(
            Arc::new(config),
            store.clone(),
            self.directory,
            queue,
            events,
            gateway,
        ));
        let app = create_router(state.clone());

        TestHarness {
            app,
            state,
            ctx,
            store,
        }
    }
}

impl TestHarness {
    pub fn with_defaults() -> Self {
        HarnessBuilder::default().build()
    }

    /// Spawn the worker pool; cancel the returned token to stop it.
    pub fn spawn_workers(&self) -> CancellationToken {
        let cancel = CancellationToken::new();
        start_workers(self.ctx.clone(), cancel.clone());
        cancel
    }

    /// Bind the router on an ephemeral port and serve it in the background.
    /// Returns the base URL.
    pub async fn serve(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let app = self.app.clone();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}", addr)
    }

    /// Poll the store until the check reaches a terminal status.
    pub async fn wait_for_terminal(&self, check_id: &str) -> Check {
        for _ in 0..300 {
            let (check, _) = self
                .store
                .get_check(check_id)
                .await
                .expect("store read")
                .expect("check exists");
            if check.status.is_terminal() {
                return check;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("check {} never reached a terminal status", check_id);
    }
}

/// Build a JSON submission request for the given text.
pub fn submit_request(text: &str) -> Request<Body> {
    submit_request_for(text, "user-1", "org-1")
}

pub fn submit_request_for(text: &str, user_id: &str, organization_id: &str) -> Request<Body> {
    let body = serde_json::json!({
        "text": text,
        "userId": user_id,
        "organizationId": organization_id,
    });
    Request::builder()
        .method("POST")
        .uri("/v1/checks")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn submit_priority_request(text: &str, priority: &str) -> Request<Body> {
    let body = serde_json::json!({
        "text": text,
        "userId": "user-1",
        "organizationId": "org-1",
        "priority": priority,
    });
    Request::builder()
        .method("POST")
        .uri("/v1/checks")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body json")
}
