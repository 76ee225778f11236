// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use baton_core::ModelError;
use baton_store::MemoryStore;

fn store() -> (Arc<MemoryStore>, Arc<dyn Store>) {
    let mem = Arc::new(MemoryStore::new());
    let store: Arc<dyn Store> = mem.clone();
    (mem, store)
}

/// `a -success-> b` under workflow "linear".
fn linear(mem: &MemoryStore) -> WorkflowId {
    let a = mem.add_job("a", "echo a", "/tmp");
    let b = mem.add_job("b", "echo b", "/tmp");
    let wf = mem.add_workflow("linear");
    let va = mem.add_workflow_vertex(wf, a, "x=1");
    let vb = mem.add_workflow_vertex(wf, b, "x=2");
    mem.add_workflow_edge(wf, va, vb, true);
    wf
}

#[tokio::test]
async fn initial_snapshots_a_template() {
    let (mem, store) = store();
    let wf = linear(&mem);

    let outcome = initial(&store, wf, 1_000).await.unwrap();
    assert_eq!(outcome.name, "linear");
    assert_eq!(outcome.start_ts, 1_000);

    let model = &outcome.model;
    assert!(model.is_finalized());
    let root_wf = model.root_workflow().unwrap();
    let graph = model.workflow_graph(root_wf).unwrap();
    assert_eq!(graph.roots.len(), 1);
    let root_vertex = *graph.roots.iter().next().unwrap();
    assert_eq!(model.vertex_attrs(root_vertex).unwrap().node_name, "a");
    assert_eq!(model.dependencies(root_vertex, true).len(), 1);
    assert!(model.dependencies(root_vertex, false).is_empty());

    // The snapshot landed in the store with the layout copied over.
    let snapshot = store.execution_snapshot(outcome.execution_id).await.unwrap().unwrap();
    assert_eq!(snapshot.workflows.len(), 1);
    assert_eq!(snapshot.vertices.len(), 2);
    assert_eq!(snapshot.edges.len(), 1);
    let layouts: Vec<&str> = snapshot.vertices.iter().map(|v| v.layout.as_str()).collect();
    assert!(layouts.contains(&"x=1") && layouts.contains(&"x=2"));
    assert!(snapshot.vertices.iter().all(|v| v.status == RunStatus::Unexecuted));
}

#[tokio::test]
async fn synthetic_wraps_one_job() {
    let (mem, store) = store();
    let job = mem.add_job("compact", "compact.sh", "/srv");

    let outcome = synthetic(&store, job, 2_000).await.unwrap();
    assert_eq!(outcome.name, "compact");

    let model = &outcome.model;
    let root_wf = model.root_workflow().unwrap();
    assert_eq!(model.workflow_template(root_wf), Some(SYNTHETIC_WORKFLOW_ID));
    assert_eq!(model.vertices().count(), 1);
    let graph = model.workflow_graph(root_wf).unwrap();
    assert_eq!(graph.roots.len(), 1);
    assert!(graph.edges.is_empty());
}

#[tokio::test]
async fn cyclic_template_fails_the_execution_row() {
    let (mem, store) = store();
    let a = mem.add_job("a", "a", "/");
    let b = mem.add_job("b", "b", "/");
    let wf = mem.add_workflow("looped");
    let va = mem.add_workflow_vertex(wf, a, "");
    let vb = mem.add_workflow_vertex(wf, b, "");
    mem.add_workflow_edge(wf, va, vb, true);
    mem.add_workflow_edge(wf, vb, va, true);

    let err = initial(&store, wf, 100).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Model(ModelError::CyclicGraph(_))));

    // The execution row records the defect; no vertex ever ran.
    let mut executions = Vec::new();
    for id in 1..100 {
        if let Some(e) = store.execution(ExecutionId(id)).await.unwrap() {
            executions.push(e);
        }
    }
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, RunStatus::FinishedError);
    assert!(executions[0].error.as_deref().unwrap_or_default().contains("cyclic"));
}

#[tokio::test]
async fn nested_template_links_child_workflows() {
    let (mem, store) = store();
    let a = mem.add_job("a", "a", "/");
    let inner = mem.add_workflow("inner");
    mem.add_workflow_vertex(inner, a, "");
    let outer = mem.add_workflow("outer");
    mem.add_workflow_vertex(outer, NodeId(inner.as_i64()), "");

    let outcome = initial(&store, outer, 10).await.unwrap();
    let model = &outcome.model;
    assert_eq!(model.workflows().count(), 2);

    let root_wf = model.root_workflow().unwrap();
    let wf_vertex = *model.workflow_graph(root_wf).unwrap().roots.iter().next().unwrap();
    let child = model.vertex_attrs(wf_vertex).unwrap().runs_wf_id.unwrap();
    assert_ne!(child, root_wf);
    assert_eq!(model.containing_vertex(child), Some(wf_vertex));

    // The link was persisted for later resume.
    let stored = store.vertex(wf_vertex).await.unwrap().unwrap();
    assert_eq!(stored.runs_exec_wf_id, Some(child));
}

#[tokio::test]
async fn duplicate_sub_workflow_references_share_one_projection() {
    let (mem, store) = store();
    let a = mem.add_job("a", "a", "/");
    let inner = mem.add_workflow("inner");
    mem.add_workflow_vertex(inner, a, "");
    let outer = mem.add_workflow("outer");
    mem.add_workflow_vertex(outer, NodeId(inner.as_i64()), "");
    mem.add_workflow_vertex(outer, NodeId(inner.as_i64()), "");

    let outcome = initial(&store, outer, 10).await.unwrap();
    // Two workflow vertices, one deduplicated child projection.
    assert_eq!(outcome.model.workflows().count(), 2);
    let children: std::collections::BTreeSet<_> = outcome
        .model
        .vertices()
        .filter_map(|v| outcome.model.vertex_attrs(v).and_then(|a| a.runs_wf_id))
        .collect();
    assert_eq!(children.len(), 1);
}

#[tokio::test]
async fn resume_replays_stored_child_links() {
    let (mem, store) = store();
    let a = mem.add_job("a", "a", "/");
    let inner = mem.add_workflow("inner");
    mem.add_workflow_vertex(inner, a, "");
    let outer = mem.add_workflow("outer");
    mem.add_workflow_vertex(outer, NodeId(inner.as_i64()), "");

    let first = initial(&store, outer, 10).await.unwrap();
    let resumed = resume(&store, first.execution_id).await.unwrap();

    assert_eq!(resumed.name, "outer");
    assert_eq!(resumed.start_ts, 10);
    for vertex in first.model.vertices() {
        assert_eq!(
            first.model.vertex_attrs(vertex).unwrap().runs_wf_id,
            resumed.model.vertex_attrs(vertex).unwrap().runs_wf_id,
        );
    }
}

#[tokio::test]
async fn resume_of_missing_execution_fails() {
    let (_mem, store) = store();
    let err = resume(&store, ExecutionId(404)).await.unwrap_err();
    assert!(matches!(err, RuntimeError::ExecutionNotFound(_)));
}
