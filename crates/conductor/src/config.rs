// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the conductor.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Conductor configuration, read from the environment at bootstrap.
#[derive(Debug, Clone)]
pub struct Config {
    /// How often `heartbeat` is broadcast to agents.
    pub heartbeat_interval: Duration,
    /// An agent whose last heartbeat-ack is older than this is declared dead.
    pub heartbeat_dead_after: Duration,
    /// Messaging endpoint.
    pub nats_url: String,
    /// Subject prefix all topics nest under.
    pub subject_prefix: String,
    /// Database endpoint, consumed by SQL-backed store adapters.
    pub db_url: Option<String>,
    /// Operator address for failure and dead-agent mail.
    pub error_email_to: Option<String>,
    /// SMTP relay host for the mail notifier.
    pub smtp_relay: String,
    /// Optional cap on concurrently dispatched vertices per agent.
    pub max_concurrent_per_agent: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            heartbeat_interval: duration_var(
                "BATON_HEARTBEAT_INTERVAL_MS",
                Duration::from_secs(15),
            )?,
            heartbeat_dead_after: duration_var(
                "BATON_HEARTBEAT_DEAD_AFTER_MS",
                Duration::from_secs(60),
            )?,
            nats_url: std::env::var("BATON_NATS_URL")
                .unwrap_or_else(|_| "nats://127.0.0.1:4222".to_string()),
            subject_prefix: std::env::var("BATON_SUBJECT_PREFIX")
                .unwrap_or_else(|_| "baton".to_string()),
            db_url: std::env::var("BATON_DB_URL").ok().filter(|s| !s.is_empty()),
            error_email_to: std::env::var("BATON_ERROR_EMAIL_TO").ok().filter(|s| !s.is_empty()),
            smtp_relay: std::env::var("BATON_SMTP_RELAY")
                .unwrap_or_else(|_| "localhost".to_string()),
            max_concurrent_per_agent: optional_u32("BATON_MAX_CONCURRENT_PER_AGENT")?,
        })
    }
}

fn duration_var(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

fn optional_u32(var: &'static str) -> Result<Option<u32>, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(None),
        Ok(raw) => {
            raw.parse::<u32>().map(Some).map_err(|_| ConfigError::Invalid { var, value: raw })
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
