// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # Message Publisher
//!
//! Publishes persisted messages to the shared exchange. Every publish call
//! acquires its own connection, declares the exchange, publishes, and closes
//! the connection again, success or failure. There is no pooling and no
//! shared channel state across calls.

use lapin::{options::BasicPublishOptions, types::ShortString, BasicProperties, Channel};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::channel::{new_amqp_channel, REPLY_SUCCESS};
use crate::errors::AmqpError;
use crate::settings::Settings;
use crate::topology;

/// Content type stamped on every published message
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// AMQP delivery mode for messages persisted to disk
const PERSISTENT_DELIVERY_MODE: u8 = 2;

/// Sends a message to the shared exchange under `routing_key`.
///
/// The body may be text or raw bytes; it is published with the persistent
/// delivery mode in all cases. By convention the routing key is the name of
/// the queue that should receive the message — nothing enforces this, and a
/// key with no matching binding loses the message silently.
pub async fn send_to_exchange(
    cfg: &Settings,
    body: impl AsRef<[u8]>,
    routing_key: &str,
) -> Result<(), AmqpError> {
    let (conn, channel) = new_amqp_channel(cfg).await?;

    let result = publish(&channel, &cfg.rabbitmq_exchange, body.as_ref(), routing_key).await;

    if let Err(err) = conn.close(REPLY_SUCCESS, "publish finished").await {
        warn!(error = err.to_string(), "failure to close the connection");
    }

    result
}

async fn publish(
    channel: &Channel,
    exchange: &str,
    body: &[u8],
    routing_key: &str,
) -> Result<(), AmqpError> {
    topology::declare_exchange(channel, exchange).await?;

    match channel
        .basic_publish(
            exchange,
            routing_key,
            BasicPublishOptions {
                immediate: false,
                mandatory: false,
            },
            body,
            message_properties(),
        )
        .await
    {
        Err(err) => {
            error!(error = err.to_string(), "error publishing message");
            Err(AmqpError::PublishingError)
        }
        _ => {
            debug!(exchange, routing_key, "message sent");
            Ok(())
        }
    }
}

fn message_properties() -> BasicProperties {
    BasicProperties::default()
        .with_content_type(ShortString::from(JSON_CONTENT_TYPE))
        .with_delivery_mode(PERSISTENT_DELIVERY_MODE)
        .with_message_id(ShortString::from(Uuid::new_v4().to_string()))
}
