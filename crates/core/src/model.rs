// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory image of one execution's graph.
//!
//! The model is built from flat snapshot rows, then frozen by
//! [`ExecutionModel::finalize`], which derives the data the controller
//! queries on every transition: per-vertex successor sets for the
//! success and failure outcomes, parent vertices across the workflow
//! nesting, and per-exec-workflow root sets. After finalization the
//! model is read-only and can be shared freely across readers.
//!
//! Vertices and exec-workflows are referenced by id everywhere; the
//! nesting (vertex → child exec-workflow → contained vertices) never
//! holds pointers, so the cyclic shape of the data is not a problem for
//! ownership.

use crate::id::{ExecVertexId, ExecWorkflowId, NodeId, WorkflowId};
use crate::status::NodeType;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Errors raised while building or finalizing a model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The internal graph of one exec-workflow has a cycle.
    #[error("cyclic graph in execution workflow {0}")]
    CyclicGraph(ExecWorkflowId),

    #[error("unknown vertex {0}")]
    UnknownVertex(ExecVertexId),

    #[error("unknown execution workflow {0}")]
    UnknownWorkflow(ExecWorkflowId),

    #[error("edge {from}->{to} crosses execution workflows")]
    CrossWorkflowEdge { from: ExecVertexId, to: ExecVertexId },

    #[error("root execution workflow not set")]
    MissingRootWorkflow,

    #[error("model is already finalized")]
    AlreadyFinalized,
}

/// Attributes of one exec-vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttrs {
    pub node_id: NodeId,
    pub node_name: String,
    pub node_type: NodeType,
    /// The exec-workflow this vertex belongs to.
    pub exec_wf_id: ExecWorkflowId,
    /// For workflow vertices: the child exec-workflow this vertex expands into.
    pub runs_wf_id: Option<ExecWorkflowId>,
}

/// One success/failure-labelled edge within an exec-workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: ExecVertexId,
    pub to: ExecVertexId,
    pub success: bool,
}

/// Internal graph of one exec-workflow, derived at finalize time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowGraph {
    /// Vertices with no incoming edge within this exec-workflow.
    pub roots: BTreeSet<ExecVertexId>,
    pub edges: Vec<Edge>,
}

/// Builder-then-immutable container for a single execution's graph.
#[derive(Debug, Default)]
pub struct ExecutionModel {
    root_wf: Option<ExecWorkflowId>,
    workflows: BTreeSet<ExecWorkflowId>,
    /// exec-workflow → workflow template (traceability).
    templates: HashMap<ExecWorkflowId, WorkflowId>,
    vertices: BTreeSet<ExecVertexId>,
    attrs: HashMap<ExecVertexId, VertexAttrs>,
    edges: HashMap<ExecWorkflowId, Vec<Edge>>,

    // Derived by finalize().
    graphs: HashMap<ExecWorkflowId, WorkflowGraph>,
    on_success: HashMap<ExecVertexId, BTreeSet<ExecVertexId>>,
    on_failure: HashMap<ExecVertexId, BTreeSet<ExecVertexId>>,
    /// exec-workflow → the workflow vertex that contains it (none for root).
    containing: HashMap<ExecWorkflowId, ExecVertexId>,
    finalized: bool,
}

impl ExecutionModel {
    pub fn new() -> Self {
        Self::default()
    }

    // -- builder operations (before finalize only) --

    pub fn add_workflows(&mut self, ids: impl IntoIterator<Item = ExecWorkflowId>) {
        debug_assert!(!self.finalized);
        self.workflows.extend(ids);
    }

    pub fn add_workflow_mapping(&mut self, exec_wf_id: ExecWorkflowId, workflow_id: WorkflowId) {
        debug_assert!(!self.finalized);
        self.templates.insert(exec_wf_id, workflow_id);
    }

    pub fn set_root_workflow(&mut self, exec_wf_id: ExecWorkflowId) {
        debug_assert!(!self.finalized);
        self.root_wf = Some(exec_wf_id);
    }

    pub fn add_vertices(&mut self, ids: impl IntoIterator<Item = ExecVertexId>) {
        debug_assert!(!self.finalized);
        self.vertices.extend(ids);
    }

    pub fn set_vertex_attrs(
        &mut self,
        vertex_id: ExecVertexId,
        node_id: NodeId,
        node_name: impl Into<String>,
        node_type: NodeType,
        belongs_to: ExecWorkflowId,
    ) {
        debug_assert!(!self.finalized);
        self.attrs.insert(
            vertex_id,
            VertexAttrs {
                node_id,
                node_name: node_name.into(),
                node_type,
                exec_wf_id: belongs_to,
                runs_wf_id: None,
            },
        );
    }

    /// Record one success/failure edge within `exec_wf_id`.
    pub fn add_dependency(
        &mut self,
        exec_wf_id: ExecWorkflowId,
        from: ExecVertexId,
        to: ExecVertexId,
        success: bool,
    ) {
        debug_assert!(!self.finalized);
        self.edges.entry(exec_wf_id).or_default().push(Edge { from, to, success });
    }

    /// Link a workflow vertex to the child exec-workflow it expands into.
    pub fn set_vertex_runs_workflow(
        &mut self,
        vertex_id: ExecVertexId,
        child: ExecWorkflowId,
    ) -> Result<(), ModelError> {
        debug_assert!(!self.finalized);
        let attrs =
            self.attrs.get_mut(&vertex_id).ok_or(ModelError::UnknownVertex(vertex_id))?;
        attrs.runs_wf_id = Some(child);
        Ok(())
    }

    /// Freeze the model: validate the graph, reject cycles, and compute
    /// successor sets, parent vertices, and per-exec-workflow roots.
    pub fn finalize(&mut self) -> Result<(), ModelError> {
        if self.finalized {
            return Err(ModelError::AlreadyFinalized);
        }
        let root = self.root_wf.ok_or(ModelError::MissingRootWorkflow)?;
        if !self.workflows.contains(&root) {
            return Err(ModelError::UnknownWorkflow(root));
        }

        // Edge validation: endpoints exist and live in the declared workflow.
        for (wf, edges) in &self.edges {
            for e in edges {
                let from = self.attrs.get(&e.from).ok_or(ModelError::UnknownVertex(e.from))?;
                let to = self.attrs.get(&e.to).ok_or(ModelError::UnknownVertex(e.to))?;
                if from.exec_wf_id != *wf || to.exec_wf_id != *wf {
                    return Err(ModelError::CrossWorkflowEdge { from: e.from, to: e.to });
                }
            }
        }

        // Per-exec-workflow graphs: roots + cycle check.
        let mut graphs: HashMap<ExecWorkflowId, WorkflowGraph> = HashMap::new();
        for wf in &self.workflows {
            let members: Vec<ExecVertexId> = self
                .attrs
                .iter()
                .filter(|(_, a)| a.exec_wf_id == *wf)
                .map(|(v, _)| *v)
                .collect();
            let edges = self.edges.get(wf).cloned().unwrap_or_default();

            let mut graph: DiGraph<ExecVertexId, bool> = DiGraph::new();
            let mut index = HashMap::new();
            for v in &members {
                index.insert(*v, graph.add_node(*v));
            }
            let mut has_incoming: BTreeSet<ExecVertexId> = BTreeSet::new();
            for e in &edges {
                // Membership verified above; skip defensively when the maps disagree.
                if let (Some(&f), Some(&t)) = (index.get(&e.from), index.get(&e.to)) {
                    graph.add_edge(f, t, e.success);
                    has_incoming.insert(e.to);
                }
            }
            if toposort(&graph, None).is_err() {
                return Err(ModelError::CyclicGraph(*wf));
            }
            let roots = members.iter().filter(|v| !has_incoming.contains(v)).copied().collect();
            graphs.insert(*wf, WorkflowGraph { roots, edges });
        }

        // Successor sets per outcome.
        let mut on_success: HashMap<ExecVertexId, BTreeSet<ExecVertexId>> = HashMap::new();
        let mut on_failure: HashMap<ExecVertexId, BTreeSet<ExecVertexId>> = HashMap::new();
        for edges in self.edges.values() {
            for e in edges {
                let slot = if e.success { &mut on_success } else { &mut on_failure };
                slot.entry(e.from).or_default().insert(e.to);
            }
        }

        // Parent pointers: the workflow vertex whose child exec-workflow is X.
        let mut containing = HashMap::new();
        for (v, attrs) in &self.attrs {
            if let Some(child) = attrs.runs_wf_id {
                containing.insert(child, *v);
            }
        }

        // The nesting must terminate at the root: a template that
        // transitively contains itself would loop the parent walk.
        for wf in &self.workflows {
            let mut cur = *wf;
            let mut steps = 0;
            while let Some(v) = containing.get(&cur) {
                let Some(attrs) = self.attrs.get(v) else { break };
                cur = attrs.exec_wf_id;
                steps += 1;
                if steps > self.workflows.len() {
                    return Err(ModelError::CyclicGraph(*wf));
                }
            }
        }

        self.graphs = graphs;
        self.on_success = on_success;
        self.on_failure = on_failure;
        self.containing = containing;
        self.finalized = true;
        Ok(())
    }

    // -- queries (safe to call concurrently after finalize) --

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn vertices(&self) -> impl Iterator<Item = ExecVertexId> + '_ {
        self.vertices.iter().copied()
    }

    pub fn workflows(&self) -> impl Iterator<Item = ExecWorkflowId> + '_ {
        self.workflows.iter().copied()
    }

    pub fn vertex_attrs(&self, id: ExecVertexId) -> Option<&VertexAttrs> {
        self.attrs.get(&id)
    }

    /// Template workflow id an exec-workflow was projected from.
    pub fn workflow_template(&self, id: ExecWorkflowId) -> Option<WorkflowId> {
        self.templates.get(&id).copied()
    }

    /// Successor vertices of `vertex_id` for the given outcome.
    pub fn dependencies(&self, vertex_id: ExecVertexId, success: bool) -> BTreeSet<ExecVertexId> {
        let slot = if success { &self.on_success } else { &self.on_failure };
        slot.get(&vertex_id).cloned().unwrap_or_default()
    }

    pub fn workflow_graph(&self, exec_wf_id: ExecWorkflowId) -> Option<&WorkflowGraph> {
        self.graphs.get(&exec_wf_id)
    }

    pub fn root_workflow(&self) -> Option<ExecWorkflowId> {
        self.root_wf
    }

    /// The workflow vertex containing this vertex's exec-workflow
    /// (none for vertices of the root exec-workflow).
    pub fn parent_vertex(&self, vertex_id: ExecVertexId) -> Option<ExecVertexId> {
        let attrs = self.attrs.get(&vertex_id)?;
        self.containing.get(&attrs.exec_wf_id).copied()
    }

    /// The workflow vertex that contains the given exec-workflow.
    pub fn containing_vertex(&self, exec_wf_id: ExecWorkflowId) -> Option<ExecVertexId> {
        self.containing.get(&exec_wf_id).copied()
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
