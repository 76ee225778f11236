// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! batond: the conductor daemon.

use baton_conductor::conductor;
use baton_conductor::publisher::spawn_status_publisher;
use baton_conductor::transport::spawn_inbox_reader;
use baton_conductor::{
    AgentTracker, BootstrapError, Config, CronTimerSource, MailNotifier, NatsTransport, Runtime,
    RuntimeDeps, Settings,
};
use baton_core::SystemClock;
use baton_store::{MemoryStore, Store};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("batond: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BootstrapError> {
    let config = Config::from_env()?;

    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .init();
    tracing::info!(?config, "batond starting");

    // SQL-backed deployments plug their adapter in here; the in-memory
    // store serves single-node operation.
    if let Some(db_url) = &config.db_url {
        tracing::info!(db_url = %db_url, "database configured (external store adapter required)");
    }
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    let transport =
        Arc::new(NatsTransport::connect(&config.nats_url, &config.subject_prefix).await?);
    let notifier = MailNotifier::new(&config.smtp_relay, config.error_email_to.as_deref())?;

    let (input_tx, input_rx) = mpsc::channel(1024);
    let (event_tx, event_rx) = mpsc::channel(256);
    let timer = Arc::new(CronTimerSource::new(input_tx.clone()));

    let settings = Settings {
        heartbeat_dead_after: config.heartbeat_dead_after,
        max_concurrent_per_agent: config.max_concurrent_per_agent,
    };
    let runtime = Arc::new(Runtime::new(
        RuntimeDeps { store, transport: Arc::clone(&transport), notifier, timer },
        SystemClock,
        settings,
        AgentTracker::new(),
        event_tx,
    ));
    runtime.warm_up().await?;

    let inbox = transport.subscribe_inbox().await?;
    spawn_inbox_reader(inbox, input_tx.clone());
    spawn_status_publisher(Arc::clone(&transport), event_rx);

    let shutdown = CancellationToken::new();
    conductor::spawn_heartbeat_ticker(
        input_tx.clone(),
        config.heartbeat_interval,
        shutdown.clone(),
    );
    conductor::spawn_watchdog_ticker(
        input_tx.clone(),
        config.heartbeat_dead_after,
        shutdown.clone(),
    );

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    conductor::run(runtime, input_rx, shutdown).await;
    Ok(())
}
