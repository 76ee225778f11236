// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Abort and resume.

use super::*;
use crate::error::RuntimeError;
use crate::runtime::{ControlRequest, Input};
use crate::test_support::TestConductor;
use baton_wire::ToAgent;

#[tokio::test]
async fn abort_kills_in_flight_vertices_and_discards_late_reports() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();

    // Two parallel roots, both in flight.
    let a = ctx.store.add_job("a", "run a", "/tmp");
    let b = ctx.store.add_job("b", "run b", "/tmp");
    let wf = ctx.store.add_workflow("wide");
    ctx.store.add_workflow_vertex(wf, a, "");
    ctx.store.add_workflow_vertex(wf, b, "");

    ctx.trigger(NodeId(wf.as_i64())).await.unwrap();
    let first = ctx.next_run_job().unwrap();
    ctx.ack_job(&first).await.unwrap();
    let second = ctx.next_run_job().unwrap();
    ctx.ack_job(&second).await.unwrap();
    ctx.drain_events();
    ctx.transport.take_sent();

    let execution_id = first.execution_id;
    ctx.handle(Input::Control(ControlRequest::AbortExecution { execution_id }))
        .await
        .unwrap();

    // Both in-flight vertices got a kill.
    let kills = ctx
        .transport
        .take_agent_messages()
        .into_iter()
        .filter(|(_, m)| matches!(m, ToAgent::KillJob { .. }))
        .count();
    assert_eq!(kills, 2);

    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::Aborted);
    assert!(vertex_statuses(&ctx, execution_id)
        .await
        .iter()
        .all(|s| *s == RunStatus::Aborted));
    assert!(!ctx.runtime.is_live(execution_id));
    match ctx.drain_events().last() {
        Some(StatusEvent::ExecutionFinished { status, .. }) => {
            assert_eq!(*status, RunStatus::Aborted)
        }
        other => panic!("expected execution-finished, got {other:?}"),
    }

    // A late report for the aborted execution is discarded.
    ctx.finish_job(&first, true).await.unwrap();
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::Aborted);
    assert!(ctx.drain_events().is_empty());
}

#[tokio::test]
async fn abort_of_unknown_execution_is_an_error() {
    let ctx = TestConductor::new();
    let err = ctx.runtime.abort_execution(ExecutionId(404)).await.unwrap_err();
    assert!(matches!(err, RuntimeError::ExecutionNotFound(_)));
}

#[tokio::test]
async fn resume_re_runs_a_failed_vertex() {
    let mut ctx = TestConductor::new();
    let job = ctx.store.add_job("flaky", "run flaky", "/tmp");

    // First run: no agents, forced failure.
    ctx.trigger(job).await.unwrap();
    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedError);

    let snapshot = ctx.store.execution_snapshot(execution_id).await.unwrap().unwrap();
    let vertex = snapshot.vertices[0].exec_vertex_id;

    // An agent shows up; resume from the failed vertex.
    ctx.register_agent("w1").await.unwrap();
    ctx.handle(Input::Control(ControlRequest::ResumeExecution {
        execution_id,
        exec_vertex_id: vertex,
    }))
    .await
    .unwrap();
    assert!(ctx.runtime.is_live(execution_id));

    assert_eq!(ctx.pump_agents(true).await.unwrap(), 1);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
    assert!(!ctx.runtime.is_live(execution_id));

    let kinds: Vec<String> = ctx
        .drain_events()
        .iter()
        .map(|e| e.log_summary().split_whitespace().next().unwrap().to_string())
        .collect();
    assert_eq!(kinds.first().map(String::as_str), Some("execution-started"));
    assert_eq!(kinds.last().map(String::as_str), Some("execution-finished"));
}

#[tokio::test]
async fn resume_is_refused_while_live() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let node = chain_workflow(&ctx, "long", &["a"]);

    ctx.trigger(node).await.unwrap();
    let a = ctx.next_run_job().unwrap();
    ctx.ack_job(&a).await.unwrap();

    let err = ctx
        .runtime
        .resume_execution(a.execution_id, a.exec_vertex_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::ExecutionAlreadyLive(_)));
    ctx.drain_events();
}

#[tokio::test]
async fn resume_of_a_foreign_vertex_is_refused() {
    let mut ctx = TestConductor::new();
    let job = ctx.store.add_job("j", "run j", "/tmp");
    ctx.trigger(job).await.unwrap();
    let events = ctx.drain_events();
    let execution_id = execution_of(&events);

    let err = ctx
        .runtime
        .resume_execution(execution_id, baton_core::ExecVertexId(9999))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownVertex(..)));
}
