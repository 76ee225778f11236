// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registration, heartbeats, and pings.

use crate::error::RuntimeError;
use crate::notify::Notifier;
use crate::runtime::Runtime;
use crate::transport::Transport;
use baton_core::{AgentId, Clock};
use baton_wire::ToAgent;

impl<T, N, C> Runtime<T, N, C>
where
    T: Transport,
    N: Notifier,
    C: Clock,
{
    /// An agent introduced itself. Registration always produces a fresh
    /// entry with zero assignments; an agent that was quarantined and
    /// came back starts over.
    pub(crate) async fn handle_agent_registering(
        &self,
        agent_id: AgentId,
    ) -> Result<(), RuntimeError> {
        let now = self.clock.epoch_ms();
        tracing::info!(agent = %agent_id, "agent registering");
        self.tracker.lock().add_agent(agent_id.clone(), now);
        self.send_to_agent(&agent_id, &ToAgent::AgentRegistered).await
    }

    /// A heartbeat-ack refreshes a known agent. An unknown sender (one
    /// the watchdog removed, or one that started before we did) is
    /// asked to re-register.
    pub(crate) async fn handle_heartbeat_ack(
        &self,
        agent_id: AgentId,
    ) -> Result<(), RuntimeError> {
        let now = self.clock.epoch_ms();
        let known = self.tracker.lock().heartbeat(&agent_id, now);
        if !known {
            tracing::info!(agent = %agent_id, "heartbeat-ack from unknown agent, requesting registration");
            self.send_to_agent(&agent_id, &ToAgent::AgentsRegister).await?;
        }
        Ok(())
    }

    pub(crate) async fn handle_ping(&self, reply_to: AgentId) -> Result<(), RuntimeError> {
        self.send_to_agent(&reply_to, &ToAgent::Pong { reply_to: reply_to.to_string() }).await
    }
}
