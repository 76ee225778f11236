// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row types of the persistent schema.
//!
//! Statuses and node types serialize as their fixed integer codes
//! (see `baton_core::status`).

use baton_core::{
    AgentId, ExecVertexId, ExecWorkflowId, ExecutionId, NodeId, NodeScheduleId, NodeType,
    RunStatus, ScheduleId, WorkflowId, WorkflowVertexId,
};
use serde::{Deserialize, Serialize};

/// `node`: a scheduling target, either a job or a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub node_type: NodeType,
    pub name: String,
    pub enabled: bool,
}

/// `job`: a node of type job plus its execution attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub node_id: NodeId,
    pub name: String,
    pub command_line: String,
    pub execution_directory: String,
    /// Restrict dispatch to these agents when present.
    pub agent_affinity: Option<Vec<AgentId>>,
    pub max_retries: u32,
    pub max_concurrent: u32,
    /// Per-job timeout shipped in `run-job`; none means unlimited.
    pub timeout_ms: Option<i64>,
}

/// `workflow_vertex`: one occurrence of a node inside a workflow template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowVertexRecord {
    pub vertex_id: WorkflowVertexId,
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    /// Opaque UI layout string, copied into snapshots untouched.
    pub layout: String,
}

/// `workflow_edge`: a directed success/failure edge between template vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdgeRecord {
    pub workflow_id: WorkflowId,
    pub from_vertex_id: WorkflowVertexId,
    pub to_vertex_id: WorkflowVertexId,
    pub success: bool,
}

/// `schedule`: a cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub schedule_id: ScheduleId,
    pub cron_expression: String,
}

/// `node_schedule`: associates a node with a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeScheduleRecord {
    pub node_schedule_id: NodeScheduleId,
    pub node_id: NodeId,
    pub schedule_id: ScheduleId,
}

/// `execution`: one run of a root workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: ExecutionId,
    pub status: RunStatus,
    pub start_ts: u64,
    pub finish_ts: Option<u64>,
    /// Filled when a trigger attempt fails before any vertex runs.
    pub error: Option<String>,
}

/// `execution_workflow`: the snapshot of one workflow template inside
/// an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionWorkflowRecord {
    pub exec_wf_id: ExecWorkflowId,
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub root: bool,
    pub status: RunStatus,
    pub start_ts: Option<u64>,
    pub finish_ts: Option<u64>,
}

/// `execution_vertex`: the snapshot of one workflow vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionVertexRecord {
    pub exec_vertex_id: ExecVertexId,
    pub exec_wf_id: ExecWorkflowId,
    pub node_id: NodeId,
    pub status: RunStatus,
    pub start_ts: Option<u64>,
    pub finish_ts: Option<u64>,
    pub layout: String,
    /// Agent the vertex was dispatched to, once started.
    pub agent_id: Option<AgentId>,
    /// For workflow vertices: the child exec-workflow they expand into.
    pub runs_exec_wf_id: Option<ExecWorkflowId>,
}

/// `execution_edge`: a snapshot edge rewired to exec-vertex ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEdgeRecord {
    pub execution_id: ExecutionId,
    pub from_exec_vertex_id: ExecVertexId,
    pub to_exec_vertex_id: ExecVertexId,
    pub success: bool,
}

/// Everything persisted for one execution, read back in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    pub execution: ExecutionRecord,
    pub workflows: Vec<ExecutionWorkflowRecord>,
    pub vertices: Vec<ExecutionVertexRecord>,
    pub edges: Vec<ExecutionEdgeRecord>,
}
