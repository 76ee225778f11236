// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistent store seam.

use crate::records::*;
use async_trait::async_trait;
use baton_core::{
    AgentId, ExecVertexId, ExecWorkflowId, ExecutionId, NodeId, RunStatus, ScheduleId, WorkflowId,
};
use thiserror::Error;

/// Reserved workflow id used for single-job (synthetic) executions.
pub const SYNTHETIC_WORKFLOW_ID: WorkflowId = WorkflowId(1);

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("job {0} not found")]
    JobNotFound(NodeId),

    #[error("execution {0} not found")]
    ExecutionNotFound(ExecutionId),

    #[error("execution workflow {0} not found")]
    ExecWorkflowNotFound(ExecWorkflowId),

    #[error("execution vertex {0} not found")]
    VertexNotFound(ExecVertexId),

    /// Backend-specific failure (connection loss, constraint violation).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistent store operations the conductor core needs.
///
/// Writes that carry idempotence semantics return whether the
/// transition actually happened, so duplicated agent messages can be
/// detected at the store boundary (terminal statuses are never
/// re-entered).
#[async_trait]
pub trait Store: Send + Sync + 'static {
    // -- template and schedule reads --

    async fn node(&self, id: NodeId) -> Result<Option<NodeRecord>, StoreError>;

    async fn nodes(&self) -> Result<Vec<NodeRecord>, StoreError>;

    async fn job(&self, id: NodeId) -> Result<Option<JobRecord>, StoreError>;

    async fn workflow_vertices(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowVertexRecord>, StoreError>;

    async fn workflow_edges(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowEdgeRecord>, StoreError>;

    async fn schedule(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>, StoreError>;

    async fn schedules(&self) -> Result<Vec<ScheduleRecord>, StoreError>;

    async fn node_schedules(&self) -> Result<Vec<NodeScheduleRecord>, StoreError>;

    async fn node_schedules_for_node(
        &self,
        node_id: NodeId,
    ) -> Result<Vec<NodeScheduleRecord>, StoreError>;

    async fn node_schedules_for_schedule(
        &self,
        schedule_id: ScheduleId,
    ) -> Result<Vec<NodeScheduleRecord>, StoreError>;

    // -- snapshot writes --

    async fn create_execution(
        &self,
        status: RunStatus,
        start_ts: u64,
    ) -> Result<ExecutionId, StoreError>;

    async fn insert_execution_workflow(
        &self,
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        root: bool,
    ) -> Result<ExecWorkflowId, StoreError>;

    async fn insert_execution_vertex(
        &self,
        execution_id: ExecutionId,
        exec_wf_id: ExecWorkflowId,
        node_id: NodeId,
        layout: String,
    ) -> Result<ExecVertexId, StoreError>;

    async fn insert_execution_edges(
        &self,
        edges: Vec<ExecutionEdgeRecord>,
    ) -> Result<(), StoreError>;

    /// Persist workflow-vertex → child-exec-workflow links so a resume
    /// can reproduce them.
    async fn set_vertex_children(
        &self,
        links: &[(ExecVertexId, ExecWorkflowId)],
    ) -> Result<(), StoreError>;

    // -- snapshot reads --

    async fn execution(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>, StoreError>;

    async fn execution_snapshot(
        &self,
        id: ExecutionId,
    ) -> Result<Option<ExecutionSnapshot>, StoreError>;

    async fn vertex(&self, id: ExecVertexId)
        -> Result<Option<ExecutionVertexRecord>, StoreError>;

    // -- status transitions --

    /// Mark an execution row failed before any vertex ran (e.g. a
    /// cyclic template).
    async fn fail_execution(
        &self,
        id: ExecutionId,
        error: &str,
        finish_ts: u64,
    ) -> Result<(), StoreError>;

    async fn finish_execution(
        &self,
        id: ExecutionId,
        status: RunStatus,
        finish_ts: u64,
    ) -> Result<(), StoreError>;

    /// Re-open a finished execution for resume.
    async fn reopen_execution(&self, id: ExecutionId, ts: u64) -> Result<(), StoreError>;

    async fn mark_workflow_started(
        &self,
        id: ExecWorkflowId,
        start_ts: u64,
    ) -> Result<(), StoreError>;

    /// Transition a vertex `unexecuted → started`, recording the agent
    /// when one is involved (workflow vertices start without one).
    /// Returns false without writing when the vertex is already started
    /// or terminal (duplicate `run-job-ack`).
    async fn mark_vertex_started(
        &self,
        id: ExecVertexId,
        agent: Option<&AgentId>,
        start_ts: u64,
    ) -> Result<bool, StoreError>;

    /// Transition a vertex to a terminal status. Returns false without
    /// writing when the vertex is already terminal (duplicate
    /// `job-finished`).
    async fn finalize_vertex(
        &self,
        id: ExecVertexId,
        status: RunStatus,
        finish_ts: u64,
    ) -> Result<bool, StoreError>;

    /// Reset vertices to `unexecuted` for a resume re-dispatch.
    async fn reset_vertices(&self, ids: &[ExecVertexId]) -> Result<(), StoreError>;

    /// Mark in-flight vertices of dead agents `unknown` (not failed).
    async fn mark_vertices_unknown(&self, ids: &[ExecVertexId]) -> Result<(), StoreError>;

    /// Persist finish statuses for a chain of workflow vertices and
    /// their exec-workflows in one transaction.
    async fn finish_workflow_chain(
        &self,
        vertices: &[(ExecVertexId, RunStatus)],
        workflows: &[(ExecWorkflowId, RunStatus)],
        finish_ts: u64,
    ) -> Result<(), StoreError>;

    /// Abort every non-terminal vertex and workflow of an execution and
    /// the execution row itself. Returns the vertices that transitioned.
    async fn abort_execution(
        &self,
        id: ExecutionId,
        finish_ts: u64,
    ) -> Result<Vec<ExecVertexId>, StoreError>;
}
