// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # Delivery Processing
//!
//! Per-delivery logic for the consumer loop: run the handler inside the
//! acknowledgment scope and settle the delivery exactly once. A handler
//! failure rejects the single delivery without requeue and leaves the loop
//! running; with no dead-letter topology declared the broker drops it.

use lapin::{
    message::Delivery,
    options::{BasicAckOptions, BasicNackOptions},
};
use tracing::{debug, error};

use crate::errors::AmqpError;
use crate::handler::{ConsumerHandler, ConsumerMessage};

/// Disposition of one delivery after its handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acknowledgment {
    /// Handler succeeded, confirm the delivery
    Ack,
    /// Handler failed, reject without requeue
    Discard,
}

/// Runs the handler and decides the delivery's disposition.
pub(crate) async fn dispatch(
    handler: &dyn ConsumerHandler,
    msg: &ConsumerMessage,
) -> Acknowledgment {
    match handler.exec(msg).await {
        Ok(()) => {
            debug!("message successfully processed");
            Acknowledgment::Ack
        }
        Err(err) => {
            error!(
                error = err.to_string(),
                queue = msg.queue.as_str(),
                "failure to handle message"
            );
            Acknowledgment::Discard
        }
    }
}

/// Processes one delivery and settles it with the broker.
pub(crate) async fn consume(
    delivery: &Delivery,
    handler: &dyn ConsumerHandler,
    queue: &str,
) -> Result<(), AmqpError> {
    let msg = ConsumerMessage::new(queue, delivery.routing_key.as_str(), &delivery.data);

    match dispatch(handler, &msg).await {
        Acknowledgment::Ack => delivery
            .ack(BasicAckOptions { multiple: false })
            .await
            .map_err(|err| {
                error!(error = err.to_string(), "failure to ack message");
                AmqpError::AckMessageError
            }),
        Acknowledgment::Discard => delivery
            .nack(BasicNackOptions {
                multiple: false,
                requeue: false,
            })
            .await
            .map_err(|err| {
                error!(error = err.to_string(), "failure to nack message");
                AmqpError::NackMessageError
            }),
    }
}
