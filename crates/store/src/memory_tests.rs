// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn synthetic_workflow_is_seeded() {
    let store = MemoryStore::new();
    let node = store.node(NodeId(SYNTHETIC_WORKFLOW_ID.as_i64())).await.unwrap().unwrap();
    assert_eq!(node.node_type, NodeType::Workflow);
    assert_eq!(node.name, "synthetic");
    assert!(!node.enabled);
}

#[tokio::test]
async fn job_rows_are_created_with_their_node() {
    let store = MemoryStore::new();
    let id = store.add_job("compact", "compact.sh", "/srv");
    let node = store.node(id).await.unwrap().unwrap();
    assert_eq!(node.node_type, NodeType::Job);
    let job = store.job(id).await.unwrap().unwrap();
    assert_eq!(job.command_line, "compact.sh");
    assert_eq!(job.max_concurrent, 1);
}

#[tokio::test]
async fn template_rows_filter_by_workflow() {
    let store = MemoryStore::new();
    let a = store.add_job("a", "a.sh", "/");
    let wf1 = store.add_workflow("one");
    let wf2 = store.add_workflow("two");
    let v1 = store.add_workflow_vertex(wf1, a, "");
    let v2 = store.add_workflow_vertex(wf1, a, "");
    let _other = store.add_workflow_vertex(wf2, a, "");
    store.add_workflow_edge(wf1, v1, v2, true);

    assert_eq!(store.workflow_vertices(wf1).await.unwrap().len(), 2);
    assert_eq!(store.workflow_vertices(wf2).await.unwrap().len(), 1);
    assert_eq!(store.workflow_edges(wf1).await.unwrap().len(), 1);
    assert!(store.workflow_edges(wf2).await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_round_trip() {
    let store = MemoryStore::new();
    let job = store.add_job("a", "a.sh", "/");
    let exec = store.create_execution(RunStatus::Started, 1_000).await.unwrap();
    let wf = store.insert_execution_workflow(exec, SYNTHETIC_WORKFLOW_ID, true).await.unwrap();
    let v = store.insert_execution_vertex(exec, wf, job, String::new()).await.unwrap();
    store
        .insert_execution_edges(vec![ExecutionEdgeRecord {
            execution_id: exec,
            from_exec_vertex_id: v,
            to_exec_vertex_id: v,
            success: true,
        }])
        .await
        .unwrap();

    let snap = store.execution_snapshot(exec).await.unwrap().unwrap();
    assert_eq!(snap.execution.execution_id, exec);
    assert_eq!(snap.workflows.len(), 1);
    assert!(snap.workflows[0].root);
    assert_eq!(snap.vertices.len(), 1);
    assert_eq!(snap.vertices[0].status, RunStatus::Unexecuted);
    assert_eq!(snap.edges.len(), 1);

    assert!(store.execution_snapshot(ExecutionId(999)).await.unwrap().is_none());
}

#[tokio::test]
async fn vertex_start_is_guarded() {
    let store = MemoryStore::new();
    let job = store.add_job("a", "a.sh", "/");
    let exec = store.create_execution(RunStatus::Started, 0).await.unwrap();
    let wf = store.insert_execution_workflow(exec, SYNTHETIC_WORKFLOW_ID, true).await.unwrap();
    let v = store.insert_execution_vertex(exec, wf, job, String::new()).await.unwrap();

    let agent = AgentId::new("w1");
    assert!(store.mark_vertex_started(v, Some(&agent), 10).await.unwrap());
    // Duplicate ack: no transition.
    assert!(!store.mark_vertex_started(v, Some(&agent), 20).await.unwrap());
    let row = store.vertex(v).await.unwrap().unwrap();
    assert_eq!(row.start_ts, Some(10));
    assert_eq!(row.agent_id, Some(agent));
}

#[tokio::test]
async fn finalize_is_a_no_op_on_terminal_vertices() {
    let store = MemoryStore::new();
    let job = store.add_job("a", "a.sh", "/");
    let exec = store.create_execution(RunStatus::Started, 0).await.unwrap();
    let wf = store.insert_execution_workflow(exec, SYNTHETIC_WORKFLOW_ID, true).await.unwrap();
    let v = store.insert_execution_vertex(exec, wf, job, String::new()).await.unwrap();

    assert!(store.finalize_vertex(v, RunStatus::FinishedSuccess, 10).await.unwrap());
    assert!(!store.finalize_vertex(v, RunStatus::FinishedError, 20).await.unwrap());
    let row = store.vertex(v).await.unwrap().unwrap();
    assert_eq!(row.status, RunStatus::FinishedSuccess);
    assert_eq!(row.finish_ts, Some(10));
}

#[tokio::test]
async fn unknown_skips_terminal_vertices() {
    let store = MemoryStore::new();
    let job = store.add_job("a", "a.sh", "/");
    let exec = store.create_execution(RunStatus::Started, 0).await.unwrap();
    let wf = store.insert_execution_workflow(exec, SYNTHETIC_WORKFLOW_ID, true).await.unwrap();
    let v1 = store.insert_execution_vertex(exec, wf, job, String::new()).await.unwrap();
    let v2 = store.insert_execution_vertex(exec, wf, job, String::new()).await.unwrap();
    store.finalize_vertex(v1, RunStatus::FinishedSuccess, 5).await.unwrap();

    store.mark_vertices_unknown(&[v1, v2]).await.unwrap();
    assert_eq!(store.vertex(v1).await.unwrap().unwrap().status, RunStatus::FinishedSuccess);
    assert_eq!(store.vertex(v2).await.unwrap().unwrap().status, RunStatus::Unknown);
}

#[tokio::test]
async fn abort_sweeps_non_terminal_rows() {
    let store = MemoryStore::new();
    let job = store.add_job("a", "a.sh", "/");
    let exec = store.create_execution(RunStatus::Started, 0).await.unwrap();
    let wf = store.insert_execution_workflow(exec, SYNTHETIC_WORKFLOW_ID, true).await.unwrap();
    let v1 = store.insert_execution_vertex(exec, wf, job, String::new()).await.unwrap();
    let v2 = store.insert_execution_vertex(exec, wf, job, String::new()).await.unwrap();
    store.finalize_vertex(v1, RunStatus::FinishedSuccess, 5).await.unwrap();

    let aborted = store.abort_execution(exec, 50).await.unwrap();
    assert_eq!(aborted, vec![v2]);
    assert_eq!(store.vertex(v2).await.unwrap().unwrap().status, RunStatus::Aborted);
    let exec_row = store.execution(exec).await.unwrap().unwrap();
    assert_eq!(exec_row.status, RunStatus::Aborted);
    assert_eq!(exec_row.finish_ts, Some(50));
}

#[tokio::test]
async fn reopen_clears_the_error_and_finish() {
    let store = MemoryStore::new();
    let exec = store.create_execution(RunStatus::Started, 0).await.unwrap();
    store.fail_execution(exec, "cyclic workflow graph", 5).await.unwrap();
    let row = store.execution(exec).await.unwrap().unwrap();
    assert_eq!(row.status, RunStatus::FinishedError);
    assert_eq!(row.error.as_deref(), Some("cyclic workflow graph"));

    store.reopen_execution(exec, 90).await.unwrap();
    let row = store.execution(exec).await.unwrap().unwrap();
    assert_eq!(row.status, RunStatus::Started);
    assert_eq!(row.start_ts, 90);
    assert!(row.finish_ts.is_none());
    assert!(row.error.is_none());
}

#[tokio::test]
async fn schedule_associations_index_both_ways() {
    let store = MemoryStore::new();
    let job = store.add_job("a", "a.sh", "/");
    let sched = store.add_schedule("0 0 3 * * *");
    let assoc = store.add_node_schedule(job, sched);

    assert_eq!(store.node_schedules_for_node(job).await.unwrap().len(), 1);
    assert_eq!(store.node_schedules_for_schedule(sched).await.unwrap().len(), 1);
    store.remove_node_schedule(assoc);
    assert!(store.node_schedules_for_node(job).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_rows_surface_as_errors() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.insert_execution_workflow(ExecutionId(9), SYNTHETIC_WORKFLOW_ID, true).await,
        Err(StoreError::ExecutionNotFound(_))
    ));
    assert!(matches!(
        store.finalize_vertex(ExecVertexId(9), RunStatus::FinishedSuccess, 0).await,
        Err(StoreError::VertexNotFound(_))
    ));
}
