// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! Integration tests against a live RabbitMQ broker.
//!
//! These are ignored by default; run them with a broker on the default
//! port: `cargo test -- --ignored`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lapin::{
    options::{ExchangeDeclareOptions, ExchangeDeleteOptions},
    types::FieldTable,
    ExchangeKind,
};
use tally::channel::new_amqp_channel;
use tally::count::parse_count;
use tally::dispatcher::rabbitmq_consumer;
use tally::errors::AmqpError;
use tally::handler::{ConsumerHandler, ConsumerMessage};
use tally::publisher::send_to_exchange;
use tally::settings::Settings;
use tally::topology;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

fn local_settings() -> Settings {
    Settings {
        rabbitmq_host: "localhost:5672".to_owned(),
        rabbitmq_exchange: "main".to_owned(),
        max_retries: 3,
    }
}

struct OneShot(Mutex<Option<oneshot::Sender<u64>>>);

#[async_trait]
impl ConsumerHandler for OneShot {
    async fn exec(&self, msg: &ConsumerMessage) -> Result<(), AmqpError> {
        let count =
            parse_count(&msg.data).map_err(|err| AmqpError::ConsumerError(err.to_string()))?;
        if let Some(tx) = self.0.lock().unwrap().take() {
            let _ = tx.send(count);
        }
        Ok(())
    }
}

#[tokio::test]
#[ignore = "needs a RabbitMQ broker on localhost:5672"]
async fn published_count_reaches_the_bound_queue() -> Result<(), Box<dyn std::error::Error>> {
    let settings = local_settings();

    let (tx, rx) = oneshot::channel();
    let handler = Arc::new(OneShot(Mutex::new(Some(tx))));

    let shutdown = CancellationToken::new();
    let consumer_settings = settings.clone();
    let consumer_shutdown = shutdown.clone();
    let consumer = tokio::spawn(async move {
        rabbitmq_consumer(&consumer_settings, "orders", handler, consumer_shutdown).await
    });

    // let the consumer finish declaring and binding before publishing
    tokio::time::sleep(Duration::from_millis(400)).await;

    send_to_exchange(&settings, r#"{"count":1}"#, "orders").await?;

    let count = tokio::time::timeout(Duration::from_secs(5), rx).await??;
    assert_eq!(count, 1);

    shutdown.cancel();
    consumer.await??;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a RabbitMQ broker on localhost:5672"]
async fn redeclaring_identical_topology_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let settings = local_settings();
    let (conn, channel) = new_amqp_channel(&settings).await?;

    topology::declare_exchange(&channel, "main").await?;
    topology::declare_exchange(&channel, "main").await?;
    topology::declare_queue(&channel, "orders").await?;
    topology::declare_queue(&channel, "orders").await?;
    topology::bind_queue(&channel, "orders", "main").await?;
    topology::bind_queue(&channel, "orders", "main").await?;

    conn.close(200, "test done").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a RabbitMQ broker on localhost:5672"]
async fn conflicting_redeclaration_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let settings = local_settings();
    let (conn, channel) = new_amqp_channel(&settings).await?;

    // a transient exchange with the same name the durable declaration will ask for
    channel
        .exchange_delete("tally-conflict", ExchangeDeleteOptions::default())
        .await?;
    channel
        .exchange_declare(
            "tally-conflict",
            ExchangeKind::Direct,
            ExchangeDeclareOptions {
                passive: false,
                durable: false,
                auto_delete: false,
                internal: false,
                nowait: false,
            },
            FieldTable::default(),
        )
        .await?;

    let second = conn.create_channel().await?;
    let result = topology::declare_exchange(&second, "tally-conflict").await;
    assert_eq!(
        result,
        Err(AmqpError::DeclareExchangeError("tally-conflict".to_owned()))
    );

    let cleanup = conn.create_channel().await?;
    cleanup
        .exchange_delete("tally-conflict", ExchangeDeleteOptions::default())
        .await?;

    conn.close(200, "test done").await?;
    Ok(())
}
