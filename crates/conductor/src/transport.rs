// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pub/sub transport to agents.
//!
//! One brokered client carries both logical directions: the conductor
//! publishes on per-agent, broadcast, and status subjects, and
//! subscribes to the shared conductor inbox subject that agents reply
//! on. Per-topic FIFO and best-effort delivery come from the broker;
//! idempotence of terminal messages is the controller's job.

use async_trait::async_trait;
use baton_wire::{FromAgent, Topic};
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::runtime::Input;

/// Errors from the messaging layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("subscribe failed: {0}")]
    Subscribe(String),
}

/// Publish seam the controller writes through.
///
/// Kept minimal so tests can swap in an in-process recording transport.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn publish(&self, topic: Topic, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// Production transport over NATS core.
pub struct NatsTransport {
    client: async_nats::Client,
    prefix: String,
}

impl NatsTransport {
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, TransportError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::info!(url, prefix, "connected to messaging");
        Ok(Self { client, prefix: prefix.to_string() })
    }

    /// Subscribe to the conductor inbox that agents publish replies on.
    pub async fn subscribe_inbox(&self) -> Result<async_nats::Subscriber, TransportError> {
        self.client
            .subscribe(Topic::conductor_inbox(&self.prefix))
            .await
            .map_err(|e| TransportError::Subscribe(e.to_string()))
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn publish(&self, topic: Topic, payload: Vec<u8>) -> Result<(), TransportError> {
        let subject = topic.subject(&self.prefix);
        self.client
            .publish(subject, payload.into())
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))
    }
}

/// Forward decoded agent messages from the inbox into the controller
/// channel. Undecodable payloads are logged and discarded.
pub fn spawn_inbox_reader(
    mut inbox: async_nats::Subscriber,
    tx: mpsc::Sender<Input>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = inbox.next().await {
            match baton_wire::decode::<FromAgent>(&message.payload) {
                Ok(msg) => {
                    if tx.send(Input::Agent(msg)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "undecodable agent message discarded");
                }
            }
        }
        tracing::info!("inbox reader stopped");
    })
}
