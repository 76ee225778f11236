// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status event fan-out.
//!
//! The controller writes every UI-visible event to one bounded channel;
//! this task drains it onto the status topic. The channel bounds the
//! loop rather than dropping events: when consumers stall, the
//! controller blocks on emit.

use crate::transport::Transport;
use baton_core::StatusEvent;
use baton_wire::Topic;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub fn spawn_status_publisher<T: Transport>(
    transport: Arc<T>,
    mut events: mpsc::Receiver<StatusEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let payload = match baton_wire::encode(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(error = %e, "unencodable status event dropped");
                    continue;
                }
            };
            if let Err(e) = transport.publish(Topic::StatusUpdates, payload).await {
                tracing::error!(
                    error = %e,
                    event = %event.log_summary(),
                    "status publish failed"
                );
            }
        }
        tracing::info!("status publisher stopped");
    })
}
