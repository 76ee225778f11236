// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level conductor scenarios, driven black-box through the
//! public crate APIs with the in-process transport and a scripted agent.

use baton_conductor::runtime::{ControlRequest, Input};
use baton_conductor::test_support::TestConductor;
use baton_core::{NodeId, RunStatus, StatusEvent};
use baton_store::Store;
use std::time::Duration;

fn kinds(events: &[StatusEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| {
            e.log_summary().split_whitespace().next().unwrap_or_default().to_string()
        })
        .collect()
}

/// Linear success: every vertex runs exactly once, events arrive in
/// dependency order, and the store agrees with the event stream.
#[tokio::test]
async fn linear_chain_completes_in_order() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("agent-1").await.unwrap();

    let a = ctx.store.add_job("a", "run a", "/srv");
    let b = ctx.store.add_job("b", "run b", "/srv");
    let c = ctx.store.add_job("c", "run c", "/srv");
    let wf = ctx.store.add_workflow("pipeline");
    let va = ctx.store.add_workflow_vertex(wf, a, "");
    let vb = ctx.store.add_workflow_vertex(wf, b, "");
    let vc = ctx.store.add_workflow_vertex(wf, c, "");
    ctx.store.add_workflow_edge(wf, va, vb, true);
    ctx.store.add_workflow_edge(wf, vb, vc, true);

    ctx.trigger(NodeId(wf.as_i64())).await.unwrap();
    assert_eq!(ctx.pump_agents(true).await.unwrap(), 3);

    let events = ctx.drain_events();
    assert_eq!(
        kinds(&events),
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

    // Round trip: the stored snapshot mirrors the template shape with
    // every vertex finished successfully.
    let execution_id = events[0].execution_id();
    let snapshot = ctx.store.execution_snapshot(execution_id).await.unwrap().unwrap();
    assert_eq!(snapshot.workflows.len(), 1);
    assert_eq!(snapshot.vertices.len(), 3);
    assert_eq!(snapshot.edges.len(), 2);
    assert!(snapshot.vertices.iter().all(|v| v.status == RunStatus::FinishedSuccess));
    assert_eq!(snapshot.execution.status, RunStatus::FinishedSuccess);
}

/// Failure with a failure edge: the failure successor takes over and
/// the execution still succeeds.
#[tokio::test]
async fn failure_edge_takes_over() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("agent-1").await.unwrap();

    let a = ctx.store.add_job("a", "run a", "/srv");
    let b = ctx.store.add_job("b", "run b", "/srv");
    let c = ctx.store.add_job("c", "run c", "/srv");
    let wf = ctx.store.add_workflow("guarded");
    let va = ctx.store.add_workflow_vertex(wf, a, "");
    let vb = ctx.store.add_workflow_vertex(wf, b, "");
    let vc = ctx.store.add_workflow_vertex(wf, c, "");
    ctx.store.add_workflow_edge(wf, va, vb, true);
    ctx.store.add_workflow_edge(wf, va, vc, false);

    ctx.trigger(NodeId(wf.as_i64())).await.unwrap();

    let first = ctx.next_run_job().unwrap();
    ctx.ack_job(&first).await.unwrap();
    ctx.finish_job(&first, false).await.unwrap();

    let fallback = ctx.next_run_job().unwrap();
    ctx.ack_job(&fallback).await.unwrap();
    ctx.finish_job(&fallback, true).await.unwrap();

    let events = ctx.drain_events();
    match events.last() {
        Some(StatusEvent::ExecutionFinished { status, .. }) => {
            assert_eq!(*status, RunStatus::FinishedSuccess)
        }
        other => panic!("expected execution-finished, got {other:?}"),
    }
}

/// No agent: a forced failure closes the execution without a single
/// run-job on the wire.
#[tokio::test]
async fn no_agent_forces_failure() {
    let mut ctx = TestConductor::new();
    let job = ctx.store.add_job("lonely", "run lonely", "/srv");

    ctx.trigger(job).await.unwrap();
    assert!(ctx.next_run_job().is_none());

    let events = ctx.drain_events();
    let execution_id = events[0].execution_id();
    let execution = ctx.store.execution(execution_id).await.unwrap().unwrap();
    assert_eq!(execution.status, RunStatus::FinishedError);
    assert_eq!(ctx.notifier.failed.lock().len(), 1);
}

/// Nested workflow: the child closes its containing vertex, then the
/// root closes, in that order.
#[tokio::test]
async fn nested_workflow_closes_inside_out() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("agent-1").await.unwrap();

    let a = ctx.store.add_job("a", "run a", "/srv");
    let inner = ctx.store.add_workflow("inner");
    ctx.store.add_workflow_vertex(inner, a, "");
    let outer = ctx.store.add_workflow("outer");
    ctx.store.add_workflow_vertex(outer, NodeId(inner.as_i64()), "");

    ctx.trigger(NodeId(outer.as_i64())).await.unwrap();
    assert_eq!(ctx.pump_agents(true).await.unwrap(), 1);

    let events = ctx.drain_events();
    assert_eq!(
        kinds(&events),
        [
            "execution-started",
            "wf-started",
            "wf-started",
            "job-started",
            "job-finished",
            "wf-finished",
            "wf-finished",
            "execution-finished",
        ]
    );
}

/// Dead agent: quarantine marks in-flight work unknown and keeps the
/// execution open for recovery.
#[tokio::test]
async fn dead_agent_quarantine() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("agent-1").await.unwrap();
    let job = ctx.store.add_job("slow", "run slow", "/srv");

    ctx.trigger(job).await.unwrap();
    let at = ctx.next_run_job().unwrap();
    ctx.ack_job(&at).await.unwrap();
    ctx.drain_events();

    ctx.clock.advance(Duration::from_secs(300));
    ctx.handle(Input::WatchdogTick).await.unwrap();

    let vertex = ctx.store.vertex(at.exec_vertex_id).await.unwrap().unwrap();
    assert_eq!(vertex.status, RunStatus::Unknown);
    assert_eq!(ctx.notifier.dead.lock().len(), 1);
    assert!(ctx.drain_events().is_empty());
    assert!(ctx.runtime.is_live(at.execution_id));
}

/// Duplicate terminal reports collapse to one transition.
#[tokio::test]
async fn duplicate_job_finished_is_ignored() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("agent-1").await.unwrap();
    let job = ctx.store.add_job("once", "run once", "/srv");

    ctx.trigger(job).await.unwrap();
    let at = ctx.next_run_job().unwrap();
    ctx.ack_job(&at).await.unwrap();
    ctx.finish_job(&at, true).await.unwrap();
    ctx.finish_job(&at, true).await.unwrap();

    let events = ctx.drain_events();
    let finished = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::JobFinished { .. }))
        .count();
    assert_eq!(finished, 1);
    let completions = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::ExecutionFinished { .. }))
        .count();
    assert_eq!(completions, 1);
}

/// Abort then resume: aborted vertices re-run after a reset resume.
#[tokio::test]
async fn abort_then_resume_runs_again() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("agent-1").await.unwrap();
    let job = ctx.store.add_job("retryable", "run retryable", "/srv");

    ctx.trigger(job).await.unwrap();
    let at = ctx.next_run_job().unwrap();
    ctx.ack_job(&at).await.unwrap();
    ctx.handle(Input::Control(ControlRequest::AbortExecution {
        execution_id: at.execution_id,
    }))
    .await
    .unwrap();
    assert!(!ctx.runtime.is_live(at.execution_id));
    ctx.drain_events();

    ctx.handle(Input::Control(ControlRequest::ResumeExecution {
        execution_id: at.execution_id,
        exec_vertex_id: at.exec_vertex_id,
    }))
    .await
    .unwrap();
    assert_eq!(ctx.pump_agents(true).await.unwrap(), 1);

    let execution = ctx.store.execution(at.execution_id).await.unwrap().unwrap();
    assert_eq!(execution.status, RunStatus::FinishedSuccess);
}
