// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # Consumer Loop
//!
//! The long-lived consumer: connect (with the retry policy), declare the
//! exchange and queue, bind them, then dispatch deliveries to the handler
//! until shutdown is requested. Connection and topology failures at startup
//! are fatal to the loop; handler failures are not.

use std::sync::Arc;

use futures_util::StreamExt;
use lapin::{options::BasicConsumeOptions, types::FieldTable, Channel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::channel::{new_amqp_channel, REPLY_SUCCESS};
use crate::consumer::consume;
use crate::errors::AmqpError;
use crate::handler::ConsumerHandler;
use crate::settings::Settings;
use crate::topology;

/// Consumes `queue` until the token is cancelled.
///
/// Blocks for the lifetime of the service. Returns `Ok(())` only after a
/// shutdown request; any connection or topology failure propagates to the
/// caller, which should treat it as fatal. The connection is closed on every
/// exit path.
pub async fn rabbitmq_consumer(
    cfg: &Settings,
    queue: &str,
    handler: Arc<dyn ConsumerHandler>,
    shutdown: CancellationToken,
) -> Result<(), AmqpError> {
    let (conn, channel) = new_amqp_channel(cfg).await?;

    let result = consume_loop(&channel, cfg, queue, handler, shutdown).await;

    if let Err(err) = conn.close(REPLY_SUCCESS, "consumer shutdown").await {
        warn!(error = err.to_string(), "failure to close the connection");
    }

    result
}

async fn consume_loop(
    channel: &Channel,
    cfg: &Settings,
    queue: &str,
    handler: Arc<dyn ConsumerHandler>,
    shutdown: CancellationToken,
) -> Result<(), AmqpError> {
    topology::declare_exchange(channel, &cfg.rabbitmq_exchange).await?;
    topology::declare_queue(channel, queue).await?;
    topology::bind_queue(channel, queue, &cfg.rabbitmq_exchange).await?;

    let mut consumer = match channel
        .basic_consume(
            queue,
            &format!("{queue}-consumer"),
            BasicConsumeOptions {
                no_local: false,
                no_ack: false,
                exclusive: false,
                nowait: false,
            },
            FieldTable::default(),
        )
        .await
    {
        Ok(consumer) => consumer,
        Err(err) => {
            error!(
                error = err.to_string(),
                queue, "failure to create the consumer"
            );
            return Err(AmqpError::ConsumerCreationError(queue.to_owned()));
        }
    };

    debug!(queue, "waiting for messages");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(queue, "shutdown requested, stopping consumer");
                return Ok(());
            }
            delivery = consumer.next() => match delivery {
                Some(Ok(delivery)) => {
                    if let Err(err) = consume(&delivery, handler.as_ref(), queue).await {
                        error!(error = err.to_string(), "error consuming message");
                    }
                }
                Some(Err(err)) => {
                    error!(error = err.to_string(), "error receiving delivery");
                }
                None => {
                    error!(queue, "consumer stream closed by the broker");
                    return Err(AmqpError::ConnectionError);
                }
            },
        }
    }
}
