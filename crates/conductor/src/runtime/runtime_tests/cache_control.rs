// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache refresh handlers and timer wiring.

use super::*;
use crate::error::RuntimeError;
use crate::runtime::{ControlRequest, Input};
use crate::test_support::TestConductor;

#[tokio::test]
async fn warm_up_registers_every_association() {
    let ctx = TestConductor::new();
    let job = ctx.store.add_job("nightly", "run nightly", "/tmp");
    let schedule = ctx.store.add_schedule("0 0 3 * * *");
    let assoc = ctx.store.add_node_schedule(job, schedule);

    ctx.runtime.warm_up().await.unwrap();

    let scheduled = ctx.timer.scheduled.lock().clone();
    assert_eq!(scheduled, vec![(assoc, job, "0 0 3 * * *".to_string())]);
}

#[tokio::test]
async fn node_save_refreshes_the_cached_row() {
    let ctx = TestConductor::new();
    let job = ctx.store.add_job("toggled", "run toggled", "/tmp");
    ctx.runtime.warm_up().await.unwrap();

    // Disable the node behind the cache's back, then deliver node-save.
    ctx.store.set_node_enabled(job, false);
    ctx.handle(Input::Control(ControlRequest::NodeSave { node_id: job })).await.unwrap();

    let err = ctx.trigger(job).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NodeDisabled(_)));
}

#[tokio::test]
async fn schedule_save_re_registers_associations() {
    let ctx = TestConductor::new();
    let job = ctx.store.add_job("nightly", "run nightly", "/tmp");
    let schedule = ctx.store.add_schedule("0 0 3 * * *");
    let assoc = ctx.store.add_node_schedule(job, schedule);
    ctx.runtime.warm_up().await.unwrap();
    ctx.timer.scheduled.lock().clear();

    ctx.store.update_schedule(schedule, "0 30 4 * * *");
    ctx.handle(Input::Control(ControlRequest::ScheduleSave { schedule_id: schedule }))
        .await
        .unwrap();

    let scheduled = ctx.timer.scheduled.lock().clone();
    assert_eq!(scheduled, vec![(assoc, job, "0 30 4 * * *".to_string())]);
}

#[tokio::test]
async fn schedule_assoc_reloads_the_nodes_triggers() {
    let ctx = TestConductor::new();
    let job = ctx.store.add_job("nightly", "run nightly", "/tmp");
    let schedule = ctx.store.add_schedule("0 0 3 * * *");
    let stale = ctx.store.add_node_schedule(job, schedule);
    ctx.runtime.warm_up().await.unwrap();
    ctx.timer.scheduled.lock().clear();

    // The association set changes: the old one goes, a new one arrives.
    ctx.store.remove_node_schedule(stale);
    let weekly = ctx.store.add_schedule("0 0 6 * * 1");
    let fresh = ctx.store.add_node_schedule(job, weekly);

    ctx.handle(Input::Control(ControlRequest::ScheduleAssoc { node_id: job })).await.unwrap();

    assert_eq!(ctx.timer.removed.lock().clone(), vec![job]);
    let scheduled = ctx.timer.scheduled.lock().clone();
    assert_eq!(scheduled, vec![(fresh, job, "0 0 6 * * 1".to_string())]);
}

#[tokio::test]
async fn timer_triggers_start_executions() {
    let mut ctx = TestConductor::new();
    ctx.register_agent("w1").await.unwrap();
    let job = ctx.store.add_job("cronned", "run cronned", "/tmp");

    // What CronTimerSource would enqueue when the schedule fires.
    ctx.handle(Input::Trigger { node_id: job }).await.unwrap();
    assert_eq!(ctx.pump_agents(true).await.unwrap(), 1);

    let events = ctx.drain_events();
    let execution_id = execution_of(&events);
    assert_eq!(execution_status(&ctx, execution_id).await, RunStatus::FinishedSuccess);
}
