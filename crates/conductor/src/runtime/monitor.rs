// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat broadcasting and dead-agent quarantine.
//!
//! Both run as loop inputs (ticks), so every mutation stays on the
//! controller's single writer.

use crate::error::RuntimeError;
use crate::notify::Notifier;
use crate::runtime::Runtime;
use crate::transport::Transport;
use baton_core::Clock;
use baton_wire::ToAgent;

impl<T, N, C> Runtime<T, N, C>
where
    T: Transport,
    N: Notifier,
    C: Clock,
{
    /// Broadcast a heartbeat; agents answer with heartbeat-ack.
    pub(crate) async fn handle_heartbeat_tick(&self) -> Result<(), RuntimeError> {
        self.broadcast(&ToAgent::Heartbeat).await
    }

    /// Quarantine agents whose heartbeat went stale.
    ///
    /// Their in-flight vertices become `unknown`, not failed: the jobs
    /// may still be running on the agent hosts. The agents are dropped
    /// from the tracker and operators are notified. No execution
    /// finishes from this alone.
    pub(crate) async fn handle_watchdog_tick(&self) -> Result<(), RuntimeError> {
        let now = self.clock.epoch_ms();
        let threshold = now.saturating_sub(self.settings.heartbeat_dead_after.as_millis() as u64);
        let dead = self.tracker.lock().dead_since(threshold);
        if dead.is_empty() {
            return Ok(());
        }

        let agents: Vec<String> = dead.keys().map(|a| a.to_string()).collect();
        let vertices: Vec<_> = dead.values().flatten().copied().collect();
        tracing::warn!(
            agents = ?agents,
            vertices = vertices.len(),
            "agents missed heartbeats, quarantining"
        );

        self.store.mark_vertices_unknown(&vertices).await?;
        self.tracker.lock().remove_agents(dead.keys());

        if let Err(e) = self.notifier.agents_dead(&dead).await {
            tracing::warn!(error = %e, "dead-agent notification not sent");
        }
        Ok(())
    }
}
