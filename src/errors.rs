// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # Error Types for the Messaging Layer
//!
//! This module provides the error types for AMQP operations. The `AmqpError`
//! enum covers connection establishment, channel creation, topology
//! declaration, publishing, and consumer-side failures.

use thiserror::Error;

/// Represents errors that can occur during AMQP/RabbitMQ operations.
///
/// Connection errors are only surfaced after the retry budget is exhausted;
/// topology errors are surfaced immediately and never retried, since a
/// declaration conflict is permanent rather than transient.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmqpError {
    /// Error establishing a connection to the RabbitMQ server
    #[error("failure to connect")]
    ConnectionError,

    /// Error creating a channel from an established connection
    #[error("failure to create a channel")]
    ChannelError,

    /// Error declaring an exchange with the given name
    #[error("failure to declare an exchange `{0}`")]
    DeclareExchangeError(String),

    /// Error declaring a queue with the given name
    #[error("failure to declare a queue `{0}`")]
    DeclareQueueError(String),

    /// Error binding a queue to an exchange
    #[error("failure to bind queue `{0}` to exchange `{1}`")]
    BindingError(String, String),

    /// Error publishing a message
    #[error("failure to publish")]
    PublishingError,

    /// Error registering a consumer on a queue
    #[error("failure to declare consumer on queue `{0}`")]
    ConsumerCreationError(String),

    /// Error acknowledging a message
    #[error("failure to ack message")]
    AckMessageError,

    /// Error negative-acknowledging a message
    #[error("failure to nack message")]
    NackMessageError,

    /// A delivery handler failed while processing a message
    #[error("failure to consume message `{0}`")]
    ConsumerError(String),
}
