// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Topology Management
//!
//! This module declares the fixed topology of the system: one durable direct
//! exchange, durable queues, and queue-to-exchange bindings keyed by queue
//! name. Declarations are idempotent under identical parameters; a
//! declaration that conflicts with an existing entity is a permanent error
//! and is never retried here.

use lapin::{
    options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions},
    types::FieldTable,
    Channel, ExchangeKind,
};
use tracing::{debug, error};

use crate::errors::AmqpError;

/// Declares the durable direct exchange with the given name.
pub async fn declare_exchange(channel: &Channel, name: &str) -> Result<(), AmqpError> {
    debug!("declaring exchange: {}", name);

    match channel
        .exchange_declare(
            name,
            ExchangeKind::Direct,
            ExchangeDeclareOptions {
                passive: false,
                durable: true,
                auto_delete: false,
                internal: false,
                nowait: false,
            },
            FieldTable::default(),
        )
        .await
    {
        Err(err) => {
            error!(
                error = err.to_string(),
                name, "failure to declare the exchange"
            );
            Err(AmqpError::DeclareExchangeError(name.to_owned()))
        }
        _ => {
            debug!("exchange: {} declared", name);
            Ok(())
        }
    }
}

/// Declares a durable queue with the given name. Consumers only.
pub async fn declare_queue(channel: &Channel, name: &str) -> Result<(), AmqpError> {
    debug!("declaring queue: {}", name);

    match channel
        .queue_declare(
            name,
            QueueDeclareOptions {
                passive: false,
                durable: true,
                exclusive: false,
                auto_delete: false,
                nowait: false,
            },
            FieldTable::default(),
        )
        .await
    {
        Err(err) => {
            error!(error = err.to_string(), name, "failure to declare the queue");
            Err(AmqpError::DeclareQueueError(name.to_owned()))
        }
        _ => {
            debug!("queue: {} declared", name);
            Ok(())
        }
    }
}

/// Binds a queue to an exchange.
///
/// The binding key equals the queue name; a message published under any
/// other key is routed to no queue and dropped by the broker.
pub async fn bind_queue(channel: &Channel, queue: &str, exchange: &str) -> Result<(), AmqpError> {
    debug!(
        "binding queue: {} to the exchange: {} with the key: {}",
        queue, exchange, queue
    );

    match channel
        .queue_bind(
            queue,
            exchange,
            queue,
            QueueBindOptions { nowait: false },
            FieldTable::default(),
        )
        .await
    {
        Err(err) => {
            error!(error = err.to_string(), "failure to bind queue to exchange");
            Err(AmqpError::BindingError(
                queue.to_owned(),
                exchange.to_owned(),
            ))
        }
        _ => {
            debug!("queue was bound");
            Ok(())
        }
    }
}
