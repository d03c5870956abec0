// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # Consumer Handler Contract
//!
//! The callback interface the consumer loop dispatches inbound deliveries
//! to. Handlers report failures through the returned `Result`; the dispatch
//! layer decides the acknowledgment from it.

use async_trait::async_trait;

use crate::errors::AmqpError;

/// One inbound delivery as seen by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerMessage {
    /// Queue the delivery was consumed from
    pub queue: String,
    /// Routing key the message was published under
    pub routing_key: String,
    /// Raw message body
    pub data: Vec<u8>,
}

impl ConsumerMessage {
    pub fn new(queue: &str, routing_key: &str, data: &[u8]) -> ConsumerMessage {
        ConsumerMessage {
            queue: queue.to_owned(),
            routing_key: routing_key.to_owned(),
            data: data.to_vec(),
        }
    }
}

/// Processes deliveries handed over by the consumer loop.
///
/// A returned error rejects the delivery; it does not stop the loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsumerHandler: Send + Sync {
    async fn exec(&self, msg: &ConsumerMessage) -> Result<(), AmqpError>;
}
