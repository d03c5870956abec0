// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # Process Settings
//!
//! Broker settings are read once per process from the environment (the
//! binaries load an optional `.env` file first) and shared read-only by
//! every messaging operation.

use std::env;

use thiserror::Error;

/// Retry budget applied when `MAX_RETRIES` is not set.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Errors raised while loading settings from the environment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    /// A required environment variable is not set
    #[error("missing required environment variable `{0}`")]
    MissingVar(String),

    /// An environment variable is set but its value cannot be used
    #[error("invalid value for environment variable `{0}`")]
    InvalidVar(String),
}

/// Broker settings shared by publishers and consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Broker host, optionally with a port (`rabbitmq` or `rabbitmq:5672`)
    pub rabbitmq_host: String,
    /// Name of the shared direct exchange
    pub rabbitmq_exchange: String,
    /// Maximum connection attempts before giving up, at least 1
    pub max_retries: u32,
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// `RABBITMQ_HOST` and `RABBITMQ_EXCHANGE` are required;
    /// `MAX_RETRIES` defaults to [`DEFAULT_MAX_RETRIES`] and must be ≥ 1.
    pub fn from_env() -> Result<Settings, SettingsError> {
        let rabbitmq_host = required_var("RABBITMQ_HOST")?;
        let rabbitmq_exchange = required_var("RABBITMQ_EXCHANGE")?;

        let max_retries = match env::var("MAX_RETRIES") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|retries| *retries >= 1)
                .ok_or_else(|| SettingsError::InvalidVar("MAX_RETRIES".to_owned()))?,
            Err(_) => DEFAULT_MAX_RETRIES,
        };

        Ok(Settings {
            rabbitmq_host,
            rabbitmq_exchange,
            max_retries,
        })
    }
}

/// Reads a required environment variable, failing when it is absent.
pub fn required_var(name: &str) -> Result<String, SettingsError> {
    env::var(name).map_err(|_| SettingsError::MissingVar(name.to_owned()))
}
