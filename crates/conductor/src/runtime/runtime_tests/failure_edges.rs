// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure-edge takeover and workflow failure marking.

use super::*;
use crate::test_support::TestConductor;

#[tokio::test]
async fn failure_successor_takes_over_and_workflow_succeeds() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = failure_edge_workflow(&ctx, true);

    ctx.trigger(node).await.unwrap();

    // a fails; its failure successor c runs and succeeds.
    let a = ctx.next_run_job().unwrap();
    ctx.ack_job(&a).await.unwrap();
    ctx.finish_job(&a, false).await.unwrap();

    let c = ctx.next_run_job().unwrap();
    ctx.ack_job(&c).await.unwrap();
    ctx.finish_job(&c, true).await.unwrap();

    let events = ctx.drain_events();
    let execution_id = execution_of(&events);

    // c took over, so the workflow is not failed.
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
    match events.last() {
        Some(StatusEvent::ExecutionFinished { status, .. }) => {
            assert_eq!(*status, RunStatus::FinishedSuccess)
        }
        other => panic!("expected execution-finished, got {other:?}"),
    }

    // b (the success successor) never ran.
    let statuses = vertex_statuses(&ctx, execution_id).await;
    assert_eq!(statuses.iter().filter(|s| **s == RunStatus::Unexecuted).count(), 1);
    assert!(ctx.notifier.failed.lock().is_empty());
}

#[tokio::test]
async fn failure_without_failure_edge_fails_the_workflow() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = failure_edge_workflow(&ctx, false);

    ctx.trigger(node).await.unwrap();
    let a = ctx.next_run_job().unwrap();
    ctx.ack_job(&a).await.unwrap();
    ctx.finish_job(&a, false).await.unwrap();

    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedError);
    assert!(!ctx.runtime.is_live(execution_id));

    // Operators hear about the failed execution.
    assert_eq!(ctx.notifier.failed.lock().len(), 1);
}

#[tokio::test]
async fn failing_failure_successor_fails_the_workflow() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = failure_edge_workflow(&ctx, true);

    ctx.trigger(node).await.unwrap();
    let a = ctx.next_run_job().unwrap();
    ctx.ack_job(&a).await.unwrap();
    ctx.finish_job(&a, false).await.unwrap();

    // c also fails, and it has no successors of its own.
    let c = ctx.next_run_job().unwrap();
    ctx.ack_job(&c).await.unwrap();
    ctx.finish_job(&c, false).await.unwrap();

    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedError);
}
