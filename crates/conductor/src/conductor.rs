// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The conductor event loop and its auxiliary tickers.
//!
//! The loop is the single writer: it consumes every [`Input`] and runs
//! the matching handler to completion before the next one. Auxiliary
//! tasks (tickers, the inbox reader, the status publisher) only do
//! blocking I/O and talk to the loop through the input channel.

use crate::notify::Notifier;
use crate::runtime::{Input, Runtime};
use crate::transport::Transport;
use baton_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Drive the controller until shutdown or channel close.
///
/// Handler errors are logged and the loop keeps going; nothing here
/// unwinds to the process.
pub async fn run<T, N, C>(
    runtime: Arc<Runtime<T, N, C>>,
    mut inputs: mpsc::Receiver<Input>,
    shutdown: CancellationToken,
) where
    T: Transport,
    N: Notifier,
    C: Clock,
{
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("conductor loop stopping");
                break;
            }
            next = inputs.recv() => match next {
                Some(input) => {
                    if let Err(e) = runtime.handle(input).await {
                        tracing::error!(error = %e, "handler failed");
                    }
                }
                None => {
                    tracing::info!("input channel closed, conductor loop stopping");
                    break;
                }
            }
        }
    }
}

/// Periodically ask the loop to broadcast a heartbeat.
pub fn spawn_heartbeat_ticker(
    tx: mpsc::Sender<Input>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    spawn_ticker(tx, interval, shutdown, || Input::HeartbeatTick)
}

/// Periodically ask the loop to scan for dead agents.
pub fn spawn_watchdog_ticker(
    tx: mpsc::Sender<Input>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    spawn_ticker(tx, interval, shutdown, || Input::WatchdogTick)
}

fn spawn_ticker(
    tx: mpsc::Sender<Input>,
    interval: Duration,
    shutdown: CancellationToken,
    make: impl Fn() -> Input + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if tx.send(make()).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}
