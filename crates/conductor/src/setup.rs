// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution setup: template → snapshot → model.
//!
//! Launching a workflow freezes it: one row per exec-workflow, vertex,
//! and edge is written at trigger time, so later edits to the templates
//! never touch running or past executions. The snapshot is then read
//! back and the in-memory [`ExecutionModel`] built from the flat rows;
//! the same construction path an initial run and a resume share.

use baton_core::{
    ExecVertexId, ExecWorkflowId, ExecutionId, ExecutionModel, NodeId, NodeType, RunStatus,
    WorkflowId, WorkflowVertexId,
};
use baton_store::{ExecutionEdgeRecord, ExecutionSnapshot, Store, SYNTHETIC_WORKFLOW_ID};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RuntimeError;

/// What setup hands back to the controller.
#[derive(Debug)]
pub struct SetupOutcome {
    pub execution_id: ExecutionId,
    pub model: Arc<ExecutionModel>,
    /// Root workflow name (the job name for synthetic runs).
    pub name: String,
    pub start_ts: u64,
}

/// Snapshot a workflow template and build the model for a fresh run.
pub async fn initial(
    store: &Arc<dyn Store>,
    workflow_id: WorkflowId,
    now: u64,
) -> Result<SetupOutcome, RuntimeError> {
    let root_node = store
        .node(NodeId(workflow_id.as_i64()))
        .await?
        .ok_or(RuntimeError::NodeNotFound(NodeId(workflow_id.as_i64())))?;

    // Discover every transitively referenced sub-workflow template once.
    let mut templates = vec![workflow_id];
    let mut queue = vec![workflow_id];
    while let Some(wf) = queue.pop() {
        for vertex in store.workflow_vertices(wf).await? {
            let node = store
                .node(vertex.node_id)
                .await?
                .ok_or(RuntimeError::NodeNotFound(vertex.node_id))?;
            if node.node_type == NodeType::Workflow {
                let child = WorkflowId(vertex.node_id.as_i64());
                if !templates.contains(&child) {
                    templates.push(child);
                    queue.push(child);
                }
            }
        }
    }

    let execution_id = store.create_execution(RunStatus::Started, now).await?;

    let mut wf_by_template: HashMap<WorkflowId, ExecWorkflowId> = HashMap::new();
    for template in &templates {
        let exec_wf = store
            .insert_execution_workflow(execution_id, *template, *template == workflow_id)
            .await?;
        wf_by_template.insert(*template, exec_wf);
    }

    // Project vertices, remembering both the template-vertex mapping
    // (for edge rewiring) and the child-workflow links.
    let mut vertex_map: HashMap<(WorkflowId, WorkflowVertexId), ExecVertexId> = HashMap::new();
    let mut links: Vec<(ExecVertexId, ExecWorkflowId)> = Vec::new();
    for template in &templates {
        let exec_wf = wf_by_template[template];
        for vertex in store.workflow_vertices(*template).await? {
            let exec_vertex = store
                .insert_execution_vertex(execution_id, exec_wf, vertex.node_id, vertex.layout)
                .await?;
            vertex_map.insert((*template, vertex.vertex_id), exec_vertex);
            if let Some(child) = wf_by_template.get(&WorkflowId(vertex.node_id.as_i64())) {
                links.push((exec_vertex, *child));
            }
        }
    }

    // Project edges, rewired to the minted exec-vertex ids.
    let mut edges = Vec::new();
    for template in &templates {
        for edge in store.workflow_edges(*template).await? {
            let from = vertex_map.get(&(*template, edge.from_vertex_id)).copied().ok_or_else(
                || {
                    RuntimeError::CorruptTemplate(format!(
                        "edge references missing vertex {} in workflow {template}",
                        edge.from_vertex_id
                    ))
                },
            )?;
            let to = vertex_map.get(&(*template, edge.to_vertex_id)).copied().ok_or_else(|| {
                RuntimeError::CorruptTemplate(format!(
                    "edge references missing vertex {} in workflow {template}",
                    edge.to_vertex_id
                ))
            })?;
            edges.push(ExecutionEdgeRecord {
                execution_id,
                from_exec_vertex_id: from,
                to_exec_vertex_id: to,
                success: edge.success,
            });
        }
    }
    store.insert_execution_edges(edges).await?;

    let snapshot = load_snapshot(store, execution_id).await?;
    let mut model = build_model(store, &snapshot).await?;
    for (vertex, child) in &links {
        model.set_vertex_runs_workflow(*vertex, *child)?;
    }
    if let Err(e) = model.finalize() {
        store.fail_execution(execution_id, &e.to_string(), now).await?;
        return Err(e.into());
    }
    // Persist the links so a resume reproduces the same nesting.
    store.set_vertex_children(&links).await?;

    Ok(SetupOutcome { execution_id, model: Arc::new(model), name: root_node.name, start_ts: now })
}

/// Snapshot a single job as a one-vertex synthetic workflow run.
pub async fn synthetic(
    store: &Arc<dyn Store>,
    job_node: NodeId,
    now: u64,
) -> Result<SetupOutcome, RuntimeError> {
    let node = store.node(job_node).await?.ok_or(RuntimeError::NodeNotFound(job_node))?;

    let execution_id = store.create_execution(RunStatus::Started, now).await?;
    let exec_wf =
        store.insert_execution_workflow(execution_id, SYNTHETIC_WORKFLOW_ID, true).await?;
    store.insert_execution_vertex(execution_id, exec_wf, job_node, String::new()).await?;

    let snapshot = load_snapshot(store, execution_id).await?;
    let mut model = build_model(store, &snapshot).await?;
    if let Err(e) = model.finalize() {
        store.fail_execution(execution_id, &e.to_string(), now).await?;
        return Err(e.into());
    }

    Ok(SetupOutcome { execution_id, model: Arc::new(model), name: node.name, start_ts: now })
}

/// Rebuild the model of a persisted execution for resume, replaying the
/// stored vertex→child-workflow links instead of recomputing them.
pub async fn resume(
    store: &Arc<dyn Store>,
    execution_id: ExecutionId,
) -> Result<SetupOutcome, RuntimeError> {
    let snapshot = load_snapshot(store, execution_id).await?;
    let mut model = build_model(store, &snapshot).await?;
    for vertex in &snapshot.vertices {
        if let Some(child) = vertex.runs_exec_wf_id {
            model.set_vertex_runs_workflow(vertex.exec_vertex_id, child)?;
        }
    }
    // Pure recomputation of successor/parent/root sets; the links above
    // are the only data that differs from an initial run.
    model.finalize()?;

    let root = snapshot
        .workflows
        .iter()
        .find(|w| w.root)
        .ok_or(RuntimeError::ExecutionNotFound(execution_id))?;
    let name = if root.workflow_id == SYNTHETIC_WORKFLOW_ID {
        // Synthetic runs are named after their single job.
        snapshot
            .vertices
            .first()
            .and_then(|v| model.vertex_attrs(v.exec_vertex_id))
            .map(|a| a.node_name.clone())
            .unwrap_or_else(|| "synthetic".to_string())
    } else {
        store
            .node(NodeId(root.workflow_id.as_i64()))
            .await?
            .map(|n| n.name)
            .unwrap_or_else(|| root.workflow_id.to_string())
    };

    Ok(SetupOutcome {
        execution_id,
        model: Arc::new(model),
        name,
        start_ts: snapshot.execution.start_ts,
    })
}

async fn load_snapshot(
    store: &Arc<dyn Store>,
    execution_id: ExecutionId,
) -> Result<ExecutionSnapshot, RuntimeError> {
    store
        .execution_snapshot(execution_id)
        .await?
        .ok_or(RuntimeError::ExecutionNotFound(execution_id))
}

/// Construct the model from flat snapshot rows (without child links).
async fn build_model(
    store: &Arc<dyn Store>,
    snapshot: &ExecutionSnapshot,
) -> Result<ExecutionModel, RuntimeError> {
    let mut model = ExecutionModel::new();

    model.add_workflows(snapshot.workflows.iter().map(|w| w.exec_wf_id));
    for wf in &snapshot.workflows {
        model.add_workflow_mapping(wf.exec_wf_id, wf.workflow_id);
        if wf.root {
            model.set_root_workflow(wf.exec_wf_id);
        }
    }

    model.add_vertices(snapshot.vertices.iter().map(|v| v.exec_vertex_id));
    let mut wf_of: HashMap<ExecVertexId, ExecWorkflowId> = HashMap::new();
    for vertex in &snapshot.vertices {
        let node = store
            .node(vertex.node_id)
            .await?
            .ok_or(RuntimeError::NodeNotFound(vertex.node_id))?;
        model.set_vertex_attrs(
            vertex.exec_vertex_id,
            vertex.node_id,
            node.name,
            node.node_type,
            vertex.exec_wf_id,
        );
        wf_of.insert(vertex.exec_vertex_id, vertex.exec_wf_id);
    }

    for edge in &snapshot.edges {
        let wf = wf_of
            .get(&edge.from_exec_vertex_id)
            .copied()
            .ok_or(RuntimeError::UnknownVertex(edge.from_exec_vertex_id, snapshot.execution.execution_id))?;
        model.add_dependency(wf, edge.from_exec_vertex_id, edge.to_exec_vertex_id, edge.success);
    }

    Ok(model)
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
