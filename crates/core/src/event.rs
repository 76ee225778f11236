// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UI-visible progress events.
//!
//! Every event the controller emits lands on the well-known status topic
//! for UI servers to consume. Serializes with `{"event": "kind", ...}`
//! and kebab-case fields.

use crate::id::{AgentId, ExecVertexId, ExecWorkflowId, ExecutionId};
use crate::status::RunStatus;
use serde::{Deserialize, Serialize};

/// Progress events published on the status topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum StatusEvent {
    ExecutionStarted {
        execution_id: ExecutionId,
        /// Name of the root workflow (or the job, for synthetic runs).
        name: String,
        start_ts: u64,
    },

    ExecutionFinished {
        execution_id: ExecutionId,
        status: RunStatus,
        finish_ts: u64,
    },

    WfStarted {
        execution_id: ExecutionId,
        exec_wf_id: ExecWorkflowId,
    },

    WfFinished {
        execution_id: ExecutionId,
        exec_wf_id: ExecWorkflowId,
        /// Workflow vertices closed together with this exec-workflow.
        vertices: Vec<ExecVertexId>,
        success: bool,
    },

    JobStarted {
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
        exec_wf_id: ExecWorkflowId,
        agent_id: AgentId,
    },

    JobFinished {
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
        success: bool,
        status: RunStatus,
    },
}

impl StatusEvent {
    /// Compact one-line description for log spans.
    pub fn log_summary(&self) -> String {
        match self {
            StatusEvent::ExecutionStarted { execution_id, name, .. } => {
                format!("execution-started exec={execution_id} name={name}")
            }
            StatusEvent::ExecutionFinished { execution_id, status, .. } => {
                format!("execution-finished exec={execution_id} status={status}")
            }
            StatusEvent::WfStarted { execution_id, exec_wf_id } => {
                format!("wf-started exec={execution_id} wf={exec_wf_id}")
            }
            StatusEvent::WfFinished { execution_id, exec_wf_id, success, .. } => {
                format!("wf-finished exec={execution_id} wf={exec_wf_id} success={success}")
            }
            StatusEvent::JobStarted { execution_id, exec_vertex_id, agent_id, .. } => {
                format!("job-started exec={execution_id} vertex={exec_vertex_id} agent={agent_id}")
            }
            StatusEvent::JobFinished { execution_id, exec_vertex_id, success, .. } => {
                format!("job-finished exec={execution_id} vertex={exec_vertex_id} success={success}")
            }
        }
    }

    pub fn execution_id(&self) -> ExecutionId {
        match self {
            StatusEvent::ExecutionStarted { execution_id, .. }
            | StatusEvent::ExecutionFinished { execution_id, .. }
            | StatusEvent::WfStarted { execution_id, .. }
            | StatusEvent::WfFinished { execution_id, .. }
            | StatusEvent::JobStarted { execution_id, .. }
            | StatusEvent::JobFinished { execution_id, .. } => *execution_id,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
