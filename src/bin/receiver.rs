// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! Receiver entry point. Consumes count messages from the bound queue for
//! the lifetime of the process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tally::count::parse_count;
use tally::dispatcher::rabbitmq_consumer;
use tally::errors::AmqpError;
use tally::handler::{ConsumerHandler, ConsumerMessage};
use tally::settings::{required_var, Settings};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Handles one count message: parse, log, then a short randomized unit of
/// work standing in for real processing.
struct CountHandler;

#[async_trait]
impl ConsumerHandler for CountHandler {
    async fn exec(&self, msg: &ConsumerMessage) -> Result<(), AmqpError> {
        info!(body = %String::from_utf8_lossy(&msg.data), "received message");

        let count = match parse_count(&msg.data) {
            Ok(count) => count,
            Err(err) => {
                error!(error = err.to_string(), "failure to parse count message");
                return Err(AmqpError::ConsumerError(err.to_string()));
            }
        };

        let wait_for = Duration::from_secs_f64(rand::random::<f64>());
        tokio::time::sleep(wait_for).await;

        info!(
            count,
            wait_for_ms = wait_for.as_millis() as u64,
            "message processed"
        );

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tally=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    let queue = required_var("RABBITMQ_QUEUE")?;

    info!(
        host = settings.rabbitmq_host.as_str(),
        exchange = settings.rabbitmq_exchange.as_str(),
        max_retries = settings.max_retries,
        queue = queue.as_str(),
        "starting up receiver service"
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        signal_token.cancel();
    });

    rabbitmq_consumer(&settings, &queue, Arc::new(CountHandler), shutdown).await?;

    Ok(())
}
