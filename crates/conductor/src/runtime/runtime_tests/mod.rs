// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller tests

mod abort_resume;
mod cache_control;
mod dead_agent;
mod failure_edges;
mod idempotency;
mod linear;
mod nested;
mod no_agent;

use crate::test_support::TestConductor;
use baton_core::{ExecutionId, NodeId, RunStatus, StatusEvent};
use baton_store::Store;

/// Jobs chained head-to-tail by success edges; returns the workflow's
/// node id.
fn chain_workflow(ctx: &TestConductor, name: &str, jobs: &[&str]) -> NodeId {
    let wf = ctx.store.add_workflow(name);
    let mut prev = None;
    for job_name in jobs {
        let job = ctx.store.add_job(job_name, &format!("run {job_name}"), "/tmp");
        let vertex = ctx.store.add_workflow_vertex(wf, job, "");
        if let Some(p) = prev {
            ctx.store.add_workflow_edge(wf, p, vertex, true);
        }
        prev = Some(vertex);
    }
    NodeId(wf.as_i64())
}

/// `a -success-> b; a -failure-> c`; returns the workflow's node id.
fn failure_edge_workflow(ctx: &TestConductor, with_failure_edge: bool) -> NodeId {
    let a = ctx.store.add_job("a", "run a", "/tmp");
    let b = ctx.store.add_job("b", "run b", "/tmp");
    let wf = ctx.store.add_workflow("edgy");
    let va = ctx.store.add_workflow_vertex(wf, a, "");
    let vb = ctx.store.add_workflow_vertex(wf, b, "");
    ctx.store.add_workflow_edge(wf, va, vb, true);
    if with_failure_edge {
        let c = ctx.store.add_job("c", "run c", "/tmp");
        let vc = ctx.store.add_workflow_vertex(wf, c, "");
        ctx.store.add_workflow_edge(wf, va, vc, false);
    }
    NodeId(wf.as_i64())
}

/// Root workflow with one vertex that runs a one-job sub-workflow;
/// optionally a job successor behind the workflow vertex.
fn nested_workflow(ctx: &TestConductor, with_successor: bool) -> NodeId {
    let a = ctx.store.add_job("a", "run a", "/tmp");
    let inner = ctx.store.add_workflow("inner");
    ctx.store.add_workflow_vertex(inner, a, "");

    let outer = ctx.store.add_workflow("outer");
    let vx = ctx.store.add_workflow_vertex(outer, NodeId(inner.as_i64()), "");
    if with_successor {
        let d = ctx.store.add_job("d", "run d", "/tmp");
        let vd = ctx.store.add_workflow_vertex(outer, d, "");
        ctx.store.add_workflow_edge(outer, vx, vd, true);
    }
    NodeId(outer.as_i64())
}

/// Execution id carried by the first drained event.
fn execution_of(events: &[StatusEvent]) -> ExecutionId {
    events.first().map(|e| e.execution_id()).unwrap_or_default()
}

/// Final statuses of every vertex in the execution's snapshot.
async fn vertex_statuses(ctx: &TestConductor, execution_id: ExecutionId) -> Vec<RunStatus> {
    let snapshot = ctx.store.execution_snapshot(execution_id).await.unwrap().unwrap();
    snapshot.vertices.iter().map(|v| v.status).collect()
}

async fn execution_status(ctx: &TestConductor, execution_id: ExecutionId) -> RunStatus {
    ctx.store.execution(execution_id).await.unwrap().unwrap().status
}
