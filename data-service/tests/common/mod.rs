#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use data_service::config::{CorsConfig, DataConfig};
use data_service::models::Document;
use data_service::services::{DocumentStore, MemoryDocumentStore, MongoDb};
use data_service::startup::{build_router, AppState, Application};
use service_core::error::AppError;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SERVICE_NAME: &str = "data-service-test";

/// Store whose every call fails as if the database were down.
pub struct UnreachableStore;

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn insert(&self, _document: Document) -> Result<(), AppError> {
        Err(AppError::StoreUnavailable(anyhow::anyhow!("connection refused")))
    }

    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        Err(AppError::StoreUnavailable(anyhow::anyhow!("connection refused")))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Err(AppError::StoreUnavailable(anyhow::anyhow!("connection refused")))
    }
}

pub fn router_with_store(store: Arc<dyn DocumentStore>) -> Router {
    build_router(
        AppState::new(TEST_SERVICE_NAME, store),
        &CorsConfig::default(),
    )
}

pub fn memory_router() -> Router {
    router_with_store(Arc::new(MemoryDocumentStore::new()))
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: impl Into<Body>) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Full server on a random port backed by a throwaway MongoDB database.
pub struct TestApp {
    pub address: String,
    pub db: MongoDb,
    pub db_name: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");
        std::env::set_var("STORE_BACKEND", "mongo");

        let db_name = format!("data_test_{}", Uuid::new_v4());

        let mut config = DataConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.service_name = TEST_SERVICE_NAME.to_string();
        config.mongodb.database = db_name.clone();

        let db = MongoDb::connect(&config.mongodb, TEST_SERVICE_NAME)
            .await
            .expect("Failed to connect to MongoDB");

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            db,
            db_name,
        }
    }

    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
    }
}
