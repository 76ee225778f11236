// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplicate agent messages leave the state machine untouched.

use super::*;
use crate::test_support::TestConductor;
use baton_wire::ToAgent;

#[tokio::test]
async fn duplicate_job_finished_transitions_once() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = chain_workflow(&ctx, "dup", &["a", "b"]);

    ctx.trigger(node).await.unwrap();
    let a = ctx.next_run_job().unwrap();
    ctx.ack_job(&a).await.unwrap();
    ctx.finish_job(&a, true).await.unwrap();
    // The terminal report arrives again (redelivery).
    ctx.finish_job(&a, true).await.unwrap();

    // Exactly one dispatch of b, despite two reports for a.
    let run_jobs: Vec<_> = ctx
        .transport
        .take_agent_messages()
        .into_iter()
        .filter(|(_, m)| matches!(m, ToAgent::RunJob { .. }))
        .collect();
    assert_eq!(run_jobs.len(), 1);

    // One job-finished event for a, not two.
    let events = ctx.drain_events();
    let finished_for_a = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::JobFinished { exec_vertex_id, .. } if *exec_vertex_id == a.exec_vertex_id))
        .count();
    assert_eq!(finished_for_a, 1);
}

#[tokio::test]
async fn duplicate_run_job_ack_does_not_double_count() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = chain_workflow(&ctx, "dup-ack", &["a"]);

    ctx.trigger(node).await.unwrap();
    let a = ctx.next_run_job().unwrap();
    ctx.ack_job(&a).await.unwrap();
    ctx.ack_job(&a).await.unwrap();
    ctx.finish_job(&a, true).await.unwrap();

    // Were the counter double-incremented, one decrement would leave
    // the workflow open forever. It closed.
    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert!(!ctx.runtime.is_live(execution_id));
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);

    // And only one job-started was announced.
    let started = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::JobStarted { .. }))
        .count();
    assert_eq!(started, 1);
}

#[tokio::test]
async fn reports_for_unknown_executions_are_discarded() {
    let ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();

    // Nothing is live; a stray report must be swallowed, not crash.
    ctx.handle(crate::runtime::Input::Agent(baton_wire::FromAgent::JobFinished {
        execution_id: ExecutionId(404),
        exec_vertex_id: baton_core::ExecVertexId(405),
        exec_wf_id: baton_core::ExecWorkflowId(406),
        agent_id: baton_core::AgentId::new("w1"),
        success: true,
        status: RunStatus::FinishedSuccess,
        error_msg: None,
        forced_by_conductor: false,
    }))
    .await
    .unwrap();
}
