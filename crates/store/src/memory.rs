// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store.
//!
//! HashMap-backed rows behind one mutex; every id comes from a single
//! sequence, mirroring database-minted ids. Transition methods carry
//! the same guards a SQL adapter enforces with conditional updates, so
//! duplicate agent messages are caught here in tests exactly as they
//! would be in production.

use crate::records::*;
use crate::store::{Store, StoreError, SYNTHETIC_WORKFLOW_ID};
use async_trait::async_trait;
use baton_core::{
    AgentId, ExecVertexId, ExecWorkflowId, ExecutionId, NodeId, NodeScheduleId, NodeType,
    RunStatus, ScheduleId, WorkflowId, WorkflowVertexId,
};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Inner {
    seq: i64,
    nodes: HashMap<NodeId, NodeRecord>,
    jobs: HashMap<NodeId, JobRecord>,
    workflow_vertices: HashMap<WorkflowVertexId, WorkflowVertexRecord>,
    workflow_edges: Vec<WorkflowEdgeRecord>,
    schedules: HashMap<ScheduleId, ScheduleRecord>,
    node_schedules: HashMap<NodeScheduleId, NodeScheduleRecord>,
    executions: HashMap<ExecutionId, ExecutionRecord>,
    exec_workflows: HashMap<ExecWorkflowId, ExecutionWorkflowRecord>,
    exec_vertices: HashMap<ExecVertexId, ExecutionVertexRecord>,
    exec_edges: Vec<ExecutionEdgeRecord>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.seq += 1;
        self.seq
    }
}

/// HashMap-backed [`Store`].
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut inner = Inner::default();
        // Reserve the synthetic workflow id so single-job executions
        // always have a template to reference.
        inner.seq = SYNTHETIC_WORKFLOW_ID.as_i64();
        inner.nodes.insert(
            NodeId(SYNTHETIC_WORKFLOW_ID.as_i64()),
            NodeRecord {
                node_id: NodeId(SYNTHETIC_WORKFLOW_ID.as_i64()),
                node_type: NodeType::Workflow,
                name: "synthetic".to_string(),
                enabled: false,
            },
        );
        Self { inner: Mutex::new(inner) }
    }

    // -- CRUD surface used by the editing collaborator and tests --

    /// Create a job node plus its job row; returns the node id.
    pub fn add_job(
        &self,
        name: &str,
        command_line: &str,
        execution_directory: &str,
    ) -> NodeId {
        let mut inner = self.inner.lock();
        let id = NodeId(inner.next_id());
        inner.nodes.insert(
            id,
            NodeRecord {
                node_id: id,
                node_type: NodeType::Job,
                name: name.to_string(),
                enabled: true,
            },
        );
        inner.jobs.insert(
            id,
            JobRecord {
                node_id: id,
                name: name.to_string(),
                command_line: command_line.to_string(),
                execution_directory: execution_directory.to_string(),
                agent_affinity: None,
                max_retries: 0,
                max_concurrent: 1,
                timeout_ms: None,
            },
        );
        id
    }

    /// Replace a job row (affinity, limits, timeout).
    pub fn update_job(&self, job: JobRecord) {
        self.inner.lock().jobs.insert(job.node_id, job);
    }

    /// Create a workflow node; vertices and edges are added separately.
    pub fn add_workflow(&self, name: &str) -> WorkflowId {
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        inner.nodes.insert(
            NodeId(id),
            NodeRecord {
                node_id: NodeId(id),
                node_type: NodeType::Workflow,
                name: name.to_string(),
                enabled: true,
            },
        );
        WorkflowId(id)
    }

    pub fn add_workflow_vertex(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        layout: &str,
    ) -> WorkflowVertexId {
        let mut inner = self.inner.lock();
        let id = WorkflowVertexId(inner.next_id());
        inner.workflow_vertices.insert(
            id,
            WorkflowVertexRecord { vertex_id: id, workflow_id, node_id, layout: layout.to_string() },
        );
        id
    }

    pub fn add_workflow_edge(
        &self,
        workflow_id: WorkflowId,
        from: WorkflowVertexId,
        to: WorkflowVertexId,
        success: bool,
    ) {
        self.inner.lock().workflow_edges.push(WorkflowEdgeRecord {
            workflow_id,
            from_vertex_id: from,
            to_vertex_id: to,
            success,
        });
    }

    pub fn add_schedule(&self, cron_expression: &str) -> ScheduleId {
        let mut inner = self.inner.lock();
        let id = ScheduleId(inner.next_id());
        inner
            .schedules
            .insert(id, ScheduleRecord { schedule_id: id, cron_expression: cron_expression.into() });
        id
    }

    pub fn add_node_schedule(&self, node_id: NodeId, schedule_id: ScheduleId) -> NodeScheduleId {
        let mut inner = self.inner.lock();
        let id = NodeScheduleId(inner.next_id());
        inner
            .node_schedules
            .insert(id, NodeScheduleRecord { node_schedule_id: id, node_id, schedule_id });
        id
    }

    pub fn remove_node_schedule(&self, id: NodeScheduleId) {
        self.inner.lock().node_schedules.remove(&id);
    }

    pub fn set_node_enabled(&self, id: NodeId, enabled: bool) {
        if let Some(node) = self.inner.lock().nodes.get_mut(&id) {
            node.enabled = enabled;
        }
    }

    pub fn update_schedule(&self, id: ScheduleId, cron_expression: &str) {
        if let Some(schedule) = self.inner.lock().schedules.get_mut(&id) {
            schedule.cron_expression = cron_expression.to_string();
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn node(&self, id: NodeId) -> Result<Option<NodeRecord>, StoreError> {
        Ok(self.inner.lock().nodes.get(&id).cloned())
    }

    async fn nodes(&self) -> Result<Vec<NodeRecord>, StoreError> {
        let mut out: Vec<_> = self.inner.lock().nodes.values().cloned().collect();
        out.sort_by_key(|n| n.node_id);
        Ok(out)
    }

    async fn job(&self, id: NodeId) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.inner.lock().jobs.get(&id).cloned())
    }

    async fn workflow_vertices(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowVertexRecord>, StoreError> {
        let mut out: Vec<_> = self
            .inner
            .lock()
            .workflow_vertices
            .values()
            .filter(|v| v.workflow_id == workflow_id)
            .cloned()
            .collect();
        out.sort_by_key(|v| v.vertex_id);
        Ok(out)
    }

    async fn workflow_edges(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowEdgeRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .workflow_edges
            .iter()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect())
    }

    async fn schedule(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>, StoreError> {
        Ok(self.inner.lock().schedules.get(&id).cloned())
    }

    async fn schedules(&self) -> Result<Vec<ScheduleRecord>, StoreError> {
        let mut out: Vec<_> = self.inner.lock().schedules.values().cloned().collect();
        out.sort_by_key(|s| s.schedule_id);
        Ok(out)
    }

    async fn node_schedules(&self) -> Result<Vec<NodeScheduleRecord>, StoreError> {
        let mut out: Vec<_> = self.inner.lock().node_schedules.values().cloned().collect();
        out.sort_by_key(|a| a.node_schedule_id);
        Ok(out)
    }

    async fn node_schedules_for_node(
        &self,
        node_id: NodeId,
    ) -> Result<Vec<NodeScheduleRecord>, StoreError> {
        let mut out: Vec<_> = self
            .inner
            .lock()
            .node_schedules
            .values()
            .filter(|a| a.node_id == node_id)
            .cloned()
            .collect();
        out.sort_by_key(|a| a.node_schedule_id);
        Ok(out)
    }

    async fn node_schedules_for_schedule(
        &self,
        schedule_id: ScheduleId,
    ) -> Result<Vec<NodeScheduleRecord>, StoreError> {
        let mut out: Vec<_> = self
            .inner
            .lock()
            .node_schedules
            .values()
            .filter(|a| a.schedule_id == schedule_id)
            .cloned()
            .collect();
        out.sort_by_key(|a| a.node_schedule_id);
        Ok(out)
    }

    async fn create_execution(
        &self,
        status: RunStatus,
        start_ts: u64,
    ) -> Result<ExecutionId, StoreError> {
        let mut inner = self.inner.lock();
        let id = ExecutionId(inner.next_id());
        inner.executions.insert(
            id,
            ExecutionRecord { execution_id: id, status, start_ts, finish_ts: None, error: None },
        );
        Ok(id)
    }

    async fn insert_execution_workflow(
        &self,
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        root: bool,
    ) -> Result<ExecWorkflowId, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.executions.contains_key(&execution_id) {
            return Err(StoreError::ExecutionNotFound(execution_id));
        }
        let id = ExecWorkflowId(inner.next_id());
        inner.exec_workflows.insert(
            id,
            ExecutionWorkflowRecord {
                exec_wf_id: id,
                execution_id,
                workflow_id,
                root,
                status: RunStatus::Unexecuted,
                start_ts: None,
                finish_ts: None,
            },
        );
        Ok(id)
    }

    async fn insert_execution_vertex(
        &self,
        execution_id: ExecutionId,
        exec_wf_id: ExecWorkflowId,
        node_id: NodeId,
        layout: String,
    ) -> Result<ExecVertexId, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.executions.contains_key(&execution_id) {
            return Err(StoreError::ExecutionNotFound(execution_id));
        }
        if !inner.exec_workflows.contains_key(&exec_wf_id) {
            return Err(StoreError::ExecWorkflowNotFound(exec_wf_id));
        }
        let id = ExecVertexId(inner.next_id());
        inner.exec_vertices.insert(
            id,
            ExecutionVertexRecord {
                exec_vertex_id: id,
                exec_wf_id,
                node_id,
                status: RunStatus::Unexecuted,
                start_ts: None,
                finish_ts: None,
                layout,
                agent_id: None,
                runs_exec_wf_id: None,
            },
        );
        Ok(id)
    }

    async fn insert_execution_edges(
        &self,
        edges: Vec<ExecutionEdgeRecord>,
    ) -> Result<(), StoreError> {
        self.inner.lock().exec_edges.extend(edges);
        Ok(())
    }

    async fn set_vertex_children(
        &self,
        links: &[(ExecVertexId, ExecWorkflowId)],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        for (vertex_id, child) in links {
            let row = inner
                .exec_vertices
                .get_mut(vertex_id)
                .ok_or(StoreError::VertexNotFound(*vertex_id))?;
            row.runs_exec_wf_id = Some(*child);
        }
        Ok(())
    }

    async fn execution(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>, StoreError> {
        Ok(self.inner.lock().executions.get(&id).cloned())
    }

    async fn execution_snapshot(
        &self,
        id: ExecutionId,
    ) -> Result<Option<ExecutionSnapshot>, StoreError> {
        let inner = self.inner.lock();
        let Some(execution) = inner.executions.get(&id).cloned() else {
            return Ok(None);
        };
        let mut workflows: Vec<_> =
            inner.exec_workflows.values().filter(|w| w.execution_id == id).cloned().collect();
        workflows.sort_by_key(|w| w.exec_wf_id);
        let wf_ids: std::collections::HashSet<_> =
            workflows.iter().map(|w| w.exec_wf_id).collect();
        let mut vertices: Vec<_> = inner
            .exec_vertices
            .values()
            .filter(|v| wf_ids.contains(&v.exec_wf_id))
            .cloned()
            .collect();
        vertices.sort_by_key(|v| v.exec_vertex_id);
        let edges: Vec<_> =
            inner.exec_edges.iter().filter(|e| e.execution_id == id).cloned().collect();
        Ok(Some(ExecutionSnapshot { execution, workflows, vertices, edges }))
    }

    async fn vertex(
        &self,
        id: ExecVertexId,
    ) -> Result<Option<ExecutionVertexRecord>, StoreError> {
        Ok(self.inner.lock().exec_vertices.get(&id).cloned())
    }

    async fn fail_execution(
        &self,
        id: ExecutionId,
        error: &str,
        finish_ts: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let row = inner.executions.get_mut(&id).ok_or(StoreError::ExecutionNotFound(id))?;
        row.status = RunStatus::FinishedError;
        row.finish_ts = Some(finish_ts);
        row.error = Some(error.to_string());
        Ok(())
    }

    async fn finish_execution(
        &self,
        id: ExecutionId,
        status: RunStatus,
        finish_ts: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let row = inner.executions.get_mut(&id).ok_or(StoreError::ExecutionNotFound(id))?;
        row.status = status;
        row.finish_ts = Some(finish_ts);
        Ok(())
    }

    async fn reopen_execution(&self, id: ExecutionId, ts: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let row = inner.executions.get_mut(&id).ok_or(StoreError::ExecutionNotFound(id))?;
        row.status = RunStatus::Started;
        row.start_ts = ts;
        row.finish_ts = None;
        row.error = None;
        Ok(())
    }

    async fn mark_workflow_started(
        &self,
        id: ExecWorkflowId,
        start_ts: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let row = inner.exec_workflows.get_mut(&id).ok_or(StoreError::ExecWorkflowNotFound(id))?;
        if row.start_ts.is_none() {
            row.start_ts = Some(start_ts);
        }
        row.status = RunStatus::Started;
        row.finish_ts = None;
        Ok(())
    }

    async fn mark_vertex_started(
        &self,
        id: ExecVertexId,
        agent: Option<&AgentId>,
        start_ts: u64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let row = inner.exec_vertices.get_mut(&id).ok_or(StoreError::VertexNotFound(id))?;
        if row.status != RunStatus::Unexecuted {
            return Ok(false);
        }
        row.status = RunStatus::Started;
        row.start_ts = Some(start_ts);
        row.agent_id = agent.cloned();
        Ok(true)
    }

    async fn finalize_vertex(
        &self,
        id: ExecVertexId,
        status: RunStatus,
        finish_ts: u64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let row = inner.exec_vertices.get_mut(&id).ok_or(StoreError::VertexNotFound(id))?;
        if row.status.is_terminal() {
            return Ok(false);
        }
        row.status = status;
        row.finish_ts = Some(finish_ts);
        Ok(true)
    }

    async fn reset_vertices(&self, ids: &[ExecVertexId]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        for id in ids {
            let row = inner.exec_vertices.get_mut(id).ok_or(StoreError::VertexNotFound(*id))?;
            row.status = RunStatus::Unexecuted;
            row.start_ts = None;
            row.finish_ts = None;
            row.agent_id = None;
        }
        Ok(())
    }

    async fn mark_vertices_unknown(&self, ids: &[ExecVertexId]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        for id in ids {
            let row = inner.exec_vertices.get_mut(id).ok_or(StoreError::VertexNotFound(*id))?;
            if !row.status.is_terminal() {
                row.status = RunStatus::Unknown;
            }
        }
        Ok(())
    }

    async fn finish_workflow_chain(
        &self,
        vertices: &[(ExecVertexId, RunStatus)],
        workflows: &[(ExecWorkflowId, RunStatus)],
        finish_ts: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        for (id, status) in vertices {
            let row = inner.exec_vertices.get_mut(id).ok_or(StoreError::VertexNotFound(*id))?;
            if !row.status.is_terminal() {
                row.status = *status;
                row.finish_ts = Some(finish_ts);
            }
        }
        for (id, status) in workflows {
            let row =
                inner.exec_workflows.get_mut(id).ok_or(StoreError::ExecWorkflowNotFound(*id))?;
            row.status = *status;
            row.finish_ts = Some(finish_ts);
        }
        Ok(())
    }

    async fn abort_execution(
        &self,
        id: ExecutionId,
        finish_ts: u64,
    ) -> Result<Vec<ExecVertexId>, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.executions.contains_key(&id) {
            return Err(StoreError::ExecutionNotFound(id));
        }
        let wf_ids: std::collections::HashSet<_> = inner
            .exec_workflows
            .values()
            .filter(|w| w.execution_id == id)
            .map(|w| w.exec_wf_id)
            .collect();

        let mut aborted = Vec::new();
        for row in inner.exec_vertices.values_mut() {
            if wf_ids.contains(&row.exec_wf_id) && !row.status.is_terminal() {
                row.status = RunStatus::Aborted;
                row.finish_ts = Some(finish_ts);
                aborted.push(row.exec_vertex_id);
            }
        }
        aborted.sort();
        for row in inner.exec_workflows.values_mut() {
            if row.execution_id == id && !row.status.is_terminal() {
                row.status = RunStatus::Aborted;
                row.finish_ts = Some(finish_ts);
            }
        }
        if let Some(row) = inner.executions.get_mut(&id) {
            row.status = RunStatus::Aborted;
            row.finish_ts = Some(finish_ts);
        }
        Ok(aborted)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
