// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messages the conductor publishes to agents.

use baton_core::{ExecVertexId, ExecWorkflowId, ExecutionId, NodeId};
use serde::{Deserialize, Serialize};

/// Wire value meaning "no per-job timeout".
pub const TIMEOUT_NONE: i64 = i64::MAX;

/// The slice of a job definition an agent needs to execute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobSpec {
    pub node_id: NodeId,
    pub name: String,
    pub command_line: String,
    pub execution_directory: String,
}

/// Conductor → agent messages.
///
/// Serializes with `{"msg": "kind", ...fields}`; field names are
/// kebab-case on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum ToAgent {
    /// Dispatch one job vertex to the receiving agent.
    RunJob {
        job: JobSpec,
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
        exec_wf_id: ExecWorkflowId,
        /// Milliseconds the agent lets the job run before self-failing;
        /// [`TIMEOUT_NONE`] means no limit.
        timeout: i64,
    },

    /// The conductor recorded the agent's job-finished; the agent can
    /// drop its local state for the vertex.
    JobFinishedAck {
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
    },

    /// Best-effort kill of an in-flight vertex (execution abort).
    KillJob {
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
    },

    /// Periodic liveness probe on the broadcast topic.
    Heartbeat,

    /// Request agents to re-introduce themselves.
    AgentsRegister,

    /// Acknowledgement to a registering agent.
    AgentRegistered,

    Pong {
        reply_to: String,
    },
}

impl ToAgent {
    /// Message kind for log spans.
    pub fn kind(&self) -> &'static str {
        match self {
            ToAgent::RunJob { .. } => "run-job",
            ToAgent::JobFinishedAck { .. } => "job-finished-ack",
            ToAgent::KillJob { .. } => "kill-job",
            ToAgent::Heartbeat => "heartbeat",
            ToAgent::AgentsRegister => "agents-register",
            ToAgent::AgentRegistered => "agent-registered",
            ToAgent::Pong { .. } => "pong",
        }
    }
}

#[cfg(test)]
#[path = "to_agent_tests.rs"]
mod tests;
