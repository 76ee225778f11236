// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic addressing for the pub/sub transport.

use baton_core::AgentId;

/// Where a published message goes.
///
/// Agents subscribe to their own id topic; every agent subscribes to
/// `broadcast`; UI servers subscribe to `status-updates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Unicast-by-subscription to one agent.
    Agent(AgentId),
    Broadcast,
    StatusUpdates,
}

impl Topic {
    /// Subject for this topic under the configured prefix.
    pub fn subject(&self, prefix: &str) -> String {
        match self {
            Topic::Agent(id) => format!("{prefix}.agent.{id}"),
            Topic::Broadcast => format!("{prefix}.broadcast"),
            Topic::StatusUpdates => format!("{prefix}.status-updates"),
        }
    }

    /// Subject agents publish replies to; the conductor subscribes here.
    pub fn conductor_inbox(prefix: &str) -> String {
        format!("{prefix}.conductor")
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Agent(id) => write!(f, "{id}"),
            Topic::Broadcast => f.write_str("broadcast"),
            Topic::StatusUpdates => f.write_str("status-updates"),
        }
    }
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
