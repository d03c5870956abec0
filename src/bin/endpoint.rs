// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! Counting API entry point. Serves the request counter over HTTP and hands
//! each increment to the broker in the background.

use std::net::SocketAddr;
use std::sync::Arc;

use tally::api::{self, AppState, ExchangePublisher};
use tally::counter::CallCounter;
use tally::settings::{required_var, Settings};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tally=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    let queue = required_var("RABBITMQ_QUEUE")?;

    let state = Arc::new(AppState {
        counter: CallCounter::new(),
        queue,
        publisher: Arc::new(ExchangePublisher::new(settings)),
    });

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
