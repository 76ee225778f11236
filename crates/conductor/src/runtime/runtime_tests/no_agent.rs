// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No eligible worker: conductor-forced failures.

use super::*;
use crate::test_support::TestConductor;
use baton_wire::{ToAgent, Topic};

#[tokio::test]
async fn empty_tracker_forces_a_clean_failure() {
    let mut ctx = TestConductor::new();
    let job = ctx.store.add_job("orphan", "run orphan", "/tmp");

    ctx.trigger(job).await.unwrap();

    // No run-job was ever published.
    let sent = ctx.transport.take_agent_messages();
    assert!(!sent.iter().any(|(_, m)| matches!(m, ToAgent::RunJob { .. })), "sent: {sent:?}");

    let events = ctx.drain_events();
    let kinds: Vec<&str> =
        events.iter().map(|e| match e {
            StatusEvent::ExecutionStarted { .. } => "execution-started",
            StatusEvent::WfStarted { .. } => "wf-started",
            StatusEvent::JobStarted { .. } => "job-started",
            StatusEvent::JobFinished { .. } => "job-finished",
            StatusEvent::WfFinished { .. } => "wf-finished",
            StatusEvent::ExecutionFinished { .. } => "execution-finished",
        })
        .collect();
    assert_eq!(
        kinds,
        ["execution-started", "wf-started", "job-finished", "wf-finished", "execution-finished"]
    );

    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedError);
    assert_eq!(vertex_statuses(&ctx, execution_id).await, vec![RunStatus::FinishedError]);
    assert!(!ctx.runtime.is_live(execution_id));
}

#[tokio::test]
async fn unplaceable_sibling_does_not_close_the_workflow_early() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();

    // Two roots: a pinned to an absent agent, b placeable.
    let a = ctx.store.add_job("a", "run a", "/tmp");
    let mut record = ctx.store.job(a).await.unwrap().unwrap();
    record.agent_affinity = Some(vec![baton_core::AgentId::new("ghost")]);
    ctx.store.update_job(record);
    let b = ctx.store.add_job("b", "run b", "/tmp");
    let wf = ctx.store.add_workflow("mixed");
    ctx.store.add_workflow_vertex(wf, a, "");
    ctx.store.add_workflow_vertex(wf, b, "");

    ctx.trigger(NodeId(wf.as_i64())).await.unwrap();

    // a was force-failed, but b's dispatch keeps the workflow open.
    let b_at = ctx.next_run_job().unwrap();
    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert!(ctx.runtime.is_live(execution_id));
    assert!(!events.iter().any(|e| matches!(e, StatusEvent::ExecutionFinished { .. })));

    ctx.ack_job(&b_at).await.unwrap();
    ctx.finish_job(&b_at, true).await.unwrap();

    // Exactly one completion, only after the placeable sibling ran;
    // the forced failure still fails the workflow.
    let events = ctx.drain_events();
    let completions = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::ExecutionFinished { .. }))
        .count();
    assert_eq!(completions, 1);
    assert!(!ctx.runtime.is_live(execution_id));
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedError);

    let statuses = vertex_statuses(&ctx, execution_id).await;
    assert!(statuses.contains(&RunStatus::FinishedError));
    assert!(statuses.contains(&RunStatus::FinishedSuccess));
    assert!(!statuses.contains(&RunStatus::Unexecuted));
}

#[tokio::test]
async fn affinity_mismatch_counts_as_no_agent() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("other").await.unwrap();

    let job = ctx.store.add_job("pinned", "run pinned", "/tmp");
    let mut record = ctx.store.job(job).await.unwrap().unwrap();
    record.agent_affinity = Some(vec![baton_core::AgentId::new("special")]);
    ctx.store.update_job(record);

    ctx.trigger(job).await.unwrap();
    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedError);

    // Nothing went to the wrong agent.
    let sent = ctx.transport.take_agent_messages();
    assert!(!sent
        .iter()
        .any(|(t, m)| matches!(m, ToAgent::RunJob { .. }) && *t == Topic::Agent("other".into())));
}
