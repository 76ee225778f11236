// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nested sub-workflows.

use super::*;
use crate::test_support::TestConductor;

#[tokio::test]
async fn child_workflow_closes_its_containing_vertex() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = nested_workflow(&ctx, false);

    ctx.trigger(node).await.unwrap();
    assert_eq!(ctx.pump_agents(true).await.unwrap(), 1);

    let events = ctx.drain_events();
    let kinds: Vec<String> = events
        .iter()
        .map(|e| e.log_summary().split_whitespace().next().unwrap().to_string())
        .collect();
    assert_eq!(
        kinds,
        [
            "execution-started",
            "wf-started", // outer
            "wf-started", // inner
            "job-started",
            "job-finished",
            "wf-finished", // inner, closing the workflow vertex
            "wf-finished", // outer
            "execution-finished",
        ]
    );

    // The inner close-out carries the containing workflow vertex.
    let inner_close = events
        .iter()
        .find_map(|e| match e {
            StatusEvent::WfFinished { vertices, success, .. } if !vertices.is_empty() => {
                Some((vertices.clone(), *success))
            }
            _ => None,
        })
        .unwrap();
    assert!(inner_close.1);

    let execution_id = execution_of(&events);
    let snapshot = ctx.store.execution_snapshot(execution_id).await.unwrap().unwrap();
    let wf_vertex =
        snapshot.vertices.iter().find(|v| v.runs_exec_wf_id.is_some()).unwrap();
    assert_eq!(inner_close.0, vec![wf_vertex.exec_vertex_id]);
    // The workflow vertex went unexecuted → started → finished-success.
    assert_eq!(wf_vertex.status, RunStatus::FinishedSuccess);
    assert!(wf_vertex.start_ts.is_some());
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
}

#[tokio::test]
async fn successors_of_the_workflow_vertex_run_after_the_child() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = nested_workflow(&ctx, true);

    ctx.trigger(node).await.unwrap();

    // First dispatch is the inner job a.
    let a = ctx.next_run_job().unwrap();
    ctx.ack_job(&a).await.unwrap();
    ctx.finish_job(&a, true).await.unwrap();

    // Only after the child closed is d dispatched.
    let d = ctx.next_run_job().unwrap();
    assert_ne!(d.exec_wf_id, a.exec_wf_id);
    ctx.ack_job(&d).await.unwrap();
    ctx.finish_job(&d, true).await.unwrap();

    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
    assert!(vertex_statuses(&ctx, execution_id)
        .await
        .iter()
        .all(|s| *s == RunStatus::FinishedSuccess));
}

#[tokio::test]
async fn sibling_job_finishing_first_leaves_the_parent_open_for_the_child() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();

    // Parent roots: job j next to a workflow vertex running inner(c).
    let c = ctx.store.add_job("c", "run c", "/tmp");
    let inner = ctx.store.add_workflow("inner");
    ctx.store.add_workflow_vertex(inner, c, "");
    let j = ctx.store.add_job("j", "run j", "/tmp");
    let outer = ctx.store.add_workflow("outer");
    ctx.store.add_workflow_vertex(outer, j, "");
    ctx.store.add_workflow_vertex(outer, NodeId(inner.as_i64()), "");

    ctx.trigger(NodeId(outer.as_i64())).await.unwrap();

    // j finishes while the child's c is still in flight; the parent
    // (and the execution) must stay open.
    let j_at = ctx.next_run_job().unwrap();
    let c_at = ctx.next_run_job().unwrap();
    assert_ne!(j_at.exec_wf_id, c_at.exec_wf_id);
    ctx.ack_job(&j_at).await.unwrap();
    ctx.finish_job(&j_at, true).await.unwrap();

    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert!(ctx.runtime.is_live(execution_id));
    assert!(!events.iter().any(|e| matches!(e, StatusEvent::ExecutionFinished { .. })));

    ctx.ack_job(&c_at).await.unwrap();
    ctx.finish_job(&c_at, true).await.unwrap();

    let events = ctx.drain_events();
    let completions = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::ExecutionFinished { .. }))
        .count();
    assert_eq!(completions, 1);
    assert!(!ctx.runtime.is_live(execution_id));
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
    assert!(vertex_statuses(&ctx, execution_id)
        .await
        .iter()
        .all(|s| *s == RunStatus::FinishedSuccess));
}

#[tokio::test]
async fn failed_child_workflow_fails_upward_without_failure_edges() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = nested_workflow(&ctx, false);

    ctx.trigger(node).await.unwrap();
    assert_eq!(ctx.pump_agents(false).await.unwrap(), 1);

    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedError);

    // The containing vertex finished in error along with its child.
    let snapshot = ctx.store.execution_snapshot(execution_id).await.unwrap().unwrap();
    let wf_vertex =
        snapshot.vertices.iter().find(|v| v.runs_exec_wf_id.is_some()).unwrap();
    assert_eq!(wf_vertex.status, RunStatus::FinishedError);
}
