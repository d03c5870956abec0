// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # Count Payload
//!
//! The message body exchanged between the endpoint and the receiver, plus
//! the tagged parse step the receiver's handler inspects instead of relying
//! on implicit error propagation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Number of calls served so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub count: u64,
}

/// Ways an inbound count message can be unusable.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CountParseError {
    /// The delivery carried no body at all
    #[error("empty message body")]
    EmptyBody,

    /// The body is not valid UTF-8/JSON
    #[error("message body is not valid JSON: {0}")]
    InvalidJson(String),

    /// The body is JSON but has no non-negative integer `count` field
    #[error("message does not contain an integer `count` field")]
    MissingField,
}

/// Extracts the `count` field from a raw message body.
pub fn parse_count(body: &[u8]) -> Result<u64, CountParseError> {
    if body.is_empty() {
        return Err(CountParseError::EmptyBody);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|err| CountParseError::InvalidJson(err.to_string()))?;

    value
        .get("count")
        .and_then(Value::as_u64)
        .ok_or(CountParseError::MissingField)
}
