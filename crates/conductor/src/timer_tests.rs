// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use baton_core::NodeId;
use std::time::Duration;

#[tokio::test]
async fn bad_expressions_are_rejected() {
    let (tx, _rx) = mpsc::channel(8);
    let timer = CronTimerSource::new(tx);
    let err = timer
        .schedule_cron_job(NodeScheduleId(1), NodeId(2), "every now and then")
        .unwrap_err();
    assert!(matches!(err, TimerError::BadExpression { .. }));
}

#[tokio::test]
async fn valid_expressions_register_and_replace() {
    let (tx, _rx) = mpsc::channel(8);
    let timer = CronTimerSource::new(tx);
    timer.schedule_cron_job(NodeScheduleId(1), NodeId(2), "0 0 3 * * *").unwrap();
    // Re-registering the same association replaces the old task.
    timer.schedule_cron_job(NodeScheduleId(1), NodeId(2), "0 30 3 * * *").unwrap();
    assert_eq!(timer.jobs.lock().len(), 1);

    timer.remove_node_triggers(NodeId(2));
    assert!(timer.jobs.lock().is_empty());
}

#[tokio::test]
async fn remove_only_drops_the_named_node() {
    let (tx, _rx) = mpsc::channel(8);
    let timer = CronTimerSource::new(tx);
    timer.schedule_cron_job(NodeScheduleId(1), NodeId(2), "0 0 3 * * *").unwrap();
    timer.schedule_cron_job(NodeScheduleId(2), NodeId(3), "0 0 4 * * *").unwrap();
    timer.remove_node_triggers(NodeId(2));
    assert_eq!(timer.jobs.lock().len(), 1);
}

#[tokio::test]
async fn every_second_schedule_fires_a_trigger() {
    let (tx, mut rx) = mpsc::channel(8);
    let timer = CronTimerSource::new(tx);
    timer.schedule_cron_job(NodeScheduleId(1), NodeId(2), "* * * * * *").unwrap();

    let fired = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;
    match fired {
        Ok(Some(Input::Trigger { node_id })) => assert_eq!(node_id, NodeId(2)),
        other => panic!("expected a trigger, got {other:?}"),
    }
}
