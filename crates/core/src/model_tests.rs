// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::status::NodeType;

fn wf(id: i64) -> ExecWorkflowId {
    ExecWorkflowId(id)
}

fn v(id: i64) -> ExecVertexId {
    ExecVertexId(id)
}

/// Single workflow `A -success-> B, A -failure-> C`.
fn diamond_tail() -> ExecutionModel {
    let mut m = ExecutionModel::new();
    m.add_workflows([wf(10)]);
    m.add_workflow_mapping(wf(10), WorkflowId(100));
    m.set_root_workflow(wf(10));
    m.add_vertices([v(1), v(2), v(3)]);
    m.set_vertex_attrs(v(1), NodeId(201), "a", NodeType::Job, wf(10));
    m.set_vertex_attrs(v(2), NodeId(202), "b", NodeType::Job, wf(10));
    m.set_vertex_attrs(v(3), NodeId(203), "c", NodeType::Job, wf(10));
    m.add_dependency(wf(10), v(1), v(2), true);
    m.add_dependency(wf(10), v(1), v(3), false);
    m
}

#[test]
fn finalize_computes_successor_sets() {
    let mut m = diamond_tail();
    m.finalize().unwrap();

    assert_eq!(m.dependencies(v(1), true), BTreeSet::from([v(2)]));
    assert_eq!(m.dependencies(v(1), false), BTreeSet::from([v(3)]));
    assert!(m.dependencies(v(2), true).is_empty());
    assert!(m.dependencies(v(99), true).is_empty());
}

#[test]
fn finalize_computes_roots() {
    let mut m = diamond_tail();
    m.finalize().unwrap();

    let graph = m.workflow_graph(wf(10)).unwrap();
    assert_eq!(graph.roots, BTreeSet::from([v(1)]));
    assert_eq!(graph.edges.len(), 2);
}

#[test]
fn cycle_is_rejected() {
    let mut m = diamond_tail();
    m.add_dependency(wf(10), v(2), v(1), true);
    assert_eq!(m.finalize(), Err(ModelError::CyclicGraph(wf(10))));
}

#[test]
fn self_edge_is_a_cycle() {
    let mut m = diamond_tail();
    m.add_dependency(wf(10), v(3), v(3), true);
    assert_eq!(m.finalize(), Err(ModelError::CyclicGraph(wf(10))));
}

#[test]
fn missing_root_is_rejected() {
    let mut m = ExecutionModel::new();
    m.add_workflows([wf(1)]);
    assert_eq!(m.finalize(), Err(ModelError::MissingRootWorkflow));
}

#[test]
fn edge_to_unknown_vertex_is_rejected() {
    let mut m = diamond_tail();
    m.add_dependency(wf(10), v(1), v(42), true);
    assert_eq!(m.finalize(), Err(ModelError::UnknownVertex(v(42))));
}

#[test]
fn cross_workflow_edge_is_rejected() {
    let mut m = diamond_tail();
    m.add_workflows([wf(11)]);
    m.add_vertices([v(4)]);
    m.set_vertex_attrs(v(4), NodeId(204), "d", NodeType::Job, wf(11));
    m.add_dependency(wf(10), v(1), v(4), true);
    assert!(matches!(m.finalize(), Err(ModelError::CrossWorkflowEdge { .. })));
}

#[test]
fn double_finalize_is_rejected() {
    let mut m = diamond_tail();
    m.finalize().unwrap();
    assert_eq!(m.finalize(), Err(ModelError::AlreadyFinalized));
}

#[test]
fn nested_workflow_parents() {
    // Root wf 10 holds vertex 1 (workflow node) running child wf 11,
    // which holds job vertex 2.
    let mut m = ExecutionModel::new();
    m.add_workflows([wf(10), wf(11)]);
    m.add_workflow_mapping(wf(10), WorkflowId(100));
    m.add_workflow_mapping(wf(11), WorkflowId(101));
    m.set_root_workflow(wf(10));
    m.add_vertices([v(1), v(2)]);
    m.set_vertex_attrs(v(1), NodeId(101), "inner", NodeType::Workflow, wf(10));
    m.set_vertex_attrs(v(2), NodeId(201), "a", NodeType::Job, wf(11));
    m.set_vertex_runs_workflow(v(1), wf(11)).unwrap();
    m.finalize().unwrap();

    assert_eq!(m.parent_vertex(v(2)), Some(v(1)));
    assert_eq!(m.parent_vertex(v(1)), None);
    assert_eq!(m.containing_vertex(wf(11)), Some(v(1)));
    assert_eq!(m.containing_vertex(wf(10)), None);
    assert_eq!(m.vertex_attrs(v(1)).unwrap().runs_wf_id, Some(wf(11)));
    assert_eq!(m.workflow_template(wf(11)), Some(WorkflowId(101)));
    assert_eq!(m.root_workflow(), Some(wf(10)));
}

#[test]
fn runs_workflow_on_unknown_vertex_fails() {
    let mut m = ExecutionModel::new();
    assert_eq!(
        m.set_vertex_runs_workflow(v(9), wf(1)),
        Err(ModelError::UnknownVertex(v(9)))
    );
}

#[test]
fn roots_of_disconnected_vertices_are_all_roots() {
    let mut m = ExecutionModel::new();
    m.add_workflows([wf(10)]);
    m.set_root_workflow(wf(10));
    m.add_vertices([v(1), v(2)]);
    m.set_vertex_attrs(v(1), NodeId(201), "a", NodeType::Job, wf(10));
    m.set_vertex_attrs(v(2), NodeId(202), "b", NodeType::Job, wf(10));
    m.finalize().unwrap();

    let graph = m.workflow_graph(wf(10)).unwrap();
    assert_eq!(graph.roots, BTreeSet::from([v(1), v(2)]));
}
