#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use http_body_util::BodyExt;
use items_service::config::{ItemsConfig, MongoConfig, ServerConfig};
use items_service::models::Item;
use items_service::services::{InMemoryItemStore, ItemStore};
use items_service::startup::{build_router, AppState, Application};
use mongodb::bson::oid::ObjectId;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tower::util::ServiceExt;

pub fn test_config(database: &str) -> ItemsConfig {
    ItemsConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            log_level: "error".to_string(),
            otlp_endpoint: None,
        },
        mongodb: MongoConfig {
            uri: std::env::var("MONGO_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database: database.to_string(),
        },
        server: ServerConfig::default(),
    }
}

pub fn router(store: Arc<InMemoryItemStore>) -> Router {
    build_router(AppState::new(store), Duration::from_secs(10))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send one request through the router and decode the JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Insert `names` straight into the store, one second apart starting at
/// [`epoch`], so `created_at` order equals insertion order.
pub async fn seed(store: &InMemoryItemStore, names: &[&str]) -> Vec<ObjectId> {
    let mut ids = Vec::with_capacity(names.len());
    for (offset, name) in names.iter().enumerate() {
        let item = Item {
            id: None,
            name: name.to_string(),
            created_at: epoch() + ChronoDuration::seconds(offset as i64),
        };
        ids.push(store.insert_one(&item).await.unwrap());
    }
    ids
}

pub fn names(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

/// An [`Application`] served over real TCP on a random port.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryItemStore>,
    stop: Option<oneshot::Sender<()>>,
    pub handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestApp {
    pub async fn spawn(store: Arc<InMemoryItemStore>) -> Self {
        let app = Application::with_store(test_config("unused"), store.clone(), None)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(app.run_until(async move {
            let _ = stopped.await;
        }));

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            store,
            stop: Some(stop),
            handle,
        }
    }

    /// Trigger graceful shutdown and wait for the server task.
    pub async fn shutdown(mut self) -> std::io::Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await.expect("server task panicked")
    }
}
