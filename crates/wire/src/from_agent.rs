// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messages agents publish to the conductor.

use baton_core::{AgentId, ExecVertexId, ExecWorkflowId, ExecutionId, RunStatus};
use serde::{Deserialize, Serialize};

/// Agent → conductor messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum FromAgent {
    /// An agent introducing (or re-introducing) itself.
    AgentRegistering { agent_id: AgentId },

    HeartbeatAck { agent_id: AgentId },

    /// The agent accepted a `run-job` and forked the command.
    RunJobAck {
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
        exec_wf_id: ExecWorkflowId,
        agent_id: AgentId,
    },

    /// Terminal report for one vertex. Also synthesized by the
    /// conductor itself when no agent is eligible for a job, with
    /// `forced-by-conductor` set.
    JobFinished {
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
        exec_wf_id: ExecWorkflowId,
        agent_id: AgentId,
        success: bool,
        status: RunStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        forced_by_conductor: bool,
    },

    Ping { reply_to: AgentId },
}

impl FromAgent {
    /// Message kind for log spans.
    pub fn kind(&self) -> &'static str {
        match self {
            FromAgent::AgentRegistering { .. } => "agent-registering",
            FromAgent::HeartbeatAck { .. } => "heartbeat-ack",
            FromAgent::RunJobAck { .. } => "run-job-ack",
            FromAgent::JobFinished { .. } => "job-finished",
            FromAgent::Ping { .. } => "ping",
        }
    }
}

#[cfg(test)]
#[path = "from_agent_tests.rs"]
mod tests;
