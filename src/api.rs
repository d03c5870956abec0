// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # HTTP Surface
//!
//! The request-counting API. Each increment mutates the process-owned
//! counter, answers immediately, and hands the serialized count to the
//! broker in a background task; the response never waits for the broker.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use crate::count::Count;
use crate::counter::CallCounter;
use crate::errors::AmqpError;
use crate::publisher::send_to_exchange;
use crate::settings::Settings;

/// Hands counts to the broker. A seam over [`send_to_exchange`] so the HTTP
/// layer can be exercised without a broker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountPublisher: Send + Sync {
    async fn send(&self, body: String, routing_key: &str) -> Result<(), AmqpError>;
}

/// Publishes counts through the shared exchange.
pub struct ExchangePublisher {
    settings: Settings,
}

impl ExchangePublisher {
    pub fn new(settings: Settings) -> ExchangePublisher {
        ExchangePublisher { settings }
    }
}

#[async_trait]
impl CountPublisher for ExchangePublisher {
    async fn send(&self, body: String, routing_key: &str) -> Result<(), AmqpError> {
        send_to_exchange(&self.settings, body, routing_key).await
    }
}

/// State shared across request handlers.
pub struct AppState {
    pub counter: CallCounter,
    /// Queue the counts are routed to; doubles as the routing key
    pub queue: String,
    pub publisher: Arc<dyn CountPublisher>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

/// Builds the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/count", get(get_count))
        .route("/api/count/increment", post(increment_count))
        .route("/health", get(read_health))
        .with_state(state)
}

/// Gets the number of times the endpoint has been called.
async fn get_count(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<Count> {
    let count = state.counter.get();
    info!(count, client = real_ip(&headers), "GET to get_count");
    Json(Count { count })
}

/// Increments and gets the number of times the endpoint has been called.
async fn increment_count(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<Count> {
    let count = state.counter.increment();
    info!(count, client = real_ip(&headers), "POST to increment");

    let body = Count { count };
    match serde_json::to_string(&body) {
        Ok(message) => {
            let publisher = state.publisher.clone();
            let routing_key = state.queue.clone();
            tokio::spawn(async move {
                if let Err(err) = publisher.send(message, &routing_key).await {
                    error!(
                        error = err.to_string(),
                        routing_key, "failure to publish count"
                    );
                }
            });
        }
        Err(err) => error!(error = err.to_string(), "failure to serialize count"),
    }

    Json(body)
}

async fn read_health() -> Json<Health> {
    Json(Health { status: "ok" })
}

fn real_ip(headers: &HeaderMap) -> &str {
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    fn state_with(publisher: Arc<dyn CountPublisher>) -> Arc<AppState> {
        Arc::new(AppState {
            counter: CallCounter::new(),
            queue: "orders".to_owned(),
            publisher,
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = router(state_with(Arc::new(MockCountPublisher::new())));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn count_snapshot_reflects_increments() {
        let state = state_with(Arc::new(MockCountPublisher::new()));
        state.counter.increment();
        state.counter.increment();

        let response = router(state)
            .oneshot(Request::get("/api/count").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"count": 2}));
    }

    #[tokio::test]
    async fn increment_publishes_the_new_count_under_the_queue_key() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = Mutex::new(Some(tx));

        let mut publisher = MockCountPublisher::new();
        publisher
            .expect_send()
            .withf(|body, key| body.as_str() == r#"{"count":1}"# && key == "orders")
            .times(1)
            .returning(move |_, _| {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(());
                }
                Ok(())
            });

        let state = state_with(Arc::new(publisher));
        let response = router(state.clone())
            .oneshot(
                Request::post("/api/count/increment")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"count": 1}));
        assert_eq!(state.counter.get(), 1);

        // the publish runs detached from the response
        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("publish task never ran")
            .unwrap();
    }

    #[tokio::test]
    async fn a_failing_publish_does_not_fail_the_request() {
        let mut publisher = MockCountPublisher::new();
        publisher
            .expect_send()
            .returning(|_, _| Err(AmqpError::ConnectionError));

        let response = router(state_with(Arc::new(publisher)))
            .oneshot(
                Request::post("/api/count/increment")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"count": 1}));
    }
}
