// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Linear chains: the straight-line happy path.

use super::*;
use crate::test_support::TestConductor;

#[tokio::test]
async fn linear_chain_runs_to_completion() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = chain_workflow(&ctx, "linear", &["a", "b", "c"]);

    ctx.trigger(node).await.unwrap();
    let ran = ctx.pump_agents(true).await.unwrap();
    assert_eq!(ran, 3);

    let events = ctx.drain_events();
    let kinds: Vec<String> = events
        .iter()
        .map(|e| e.log_summary().split_whitespace().next().unwrap().to_string())
        .collect();
    assert_eq!(
        kinds,
        [
            "execution-started",
            "wf-started",
            "job-started",
            "job-finished",
            "job-started",
            "job-finished",
            "job-started",
            "job-finished",
            "wf-finished",
            "execution-finished",
        ]
    );

    let execution_id = execution_of(&events);
    assert!(!ctx.runtime.is_live(execution_id));
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
    assert!(vertex_statuses(&ctx, execution_id)
        .await
        .iter()
        .all(|s| *s == RunStatus::FinishedSuccess));
    assert!(ctx.notifier.failed.lock().is_empty());
}

#[tokio::test]
async fn single_job_node_runs_synthetically() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let job = ctx.store.add_job("lonely", "run lonely", "/tmp");

    ctx.trigger(job).await.unwrap();
    assert_eq!(ctx.pump_agents(true).await.unwrap(), 1);

    let events = ctx.drain_events();
    match &events[0] {
        StatusEvent::ExecutionStarted { name, .. } => assert_eq!(name, "lonely"),
        other => panic!("expected execution-started, got {other:?}"),
    }
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
}

#[tokio::test]
async fn parallel_roots_all_dispatch_before_any_finish() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    ctx.register_agent("w2").await.unwrap();

    // Two independent roots in one workflow.
    let a = ctx.store.add_job("a", "run a", "/tmp");
    let b = ctx.store.add_job("b", "run b", "/tmp");
    let wf = ctx.store.add_workflow("fanout");
    ctx.store.add_workflow_vertex(wf, a, "");
    ctx.store.add_workflow_vertex(wf, b, "");

    ctx.trigger(NodeId(wf.as_i64())).await.unwrap();
    assert_eq!(ctx.pump_agents(true).await.unwrap(), 2);

    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
    // Load balancing: each agent got one of the two roots.
    assert!(matches!(events.last(), Some(StatusEvent::ExecutionFinished { .. })));
}

#[tokio::test]
async fn trigger_of_unknown_node_fails() {
    let ctx = TestConductor::new();
    let err = ctx.trigger(NodeId(999)).await.unwrap_err();
    assert!(matches!(err, crate::error::RuntimeError::NodeNotFound(_)));
}
