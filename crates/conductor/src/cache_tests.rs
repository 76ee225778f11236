// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use baton_core::NodeType;

fn node(id: i64) -> NodeRecord {
    NodeRecord { node_id: NodeId(id), node_type: NodeType::Job, name: format!("n{id}"), enabled: true }
}

fn schedule(id: i64, expr: &str) -> ScheduleRecord {
    ScheduleRecord { schedule_id: ScheduleId(id), cron_expression: expr.into() }
}

fn assoc(id: i64, node: i64, sched: i64) -> NodeScheduleRecord {
    NodeScheduleRecord {
        node_schedule_id: NodeScheduleId(id),
        node_id: NodeId(node),
        schedule_id: ScheduleId(sched),
    }
}

#[test]
fn nodes_round_trip() {
    let mut cache = ScheduleCache::new();
    cache.put_node(node(1));
    assert_eq!(cache.node(NodeId(1)).map(|n| n.name.as_str()), Some("n1"));
    cache.remove_node(NodeId(1));
    assert!(cache.node(NodeId(1)).is_none());
}

#[test]
fn put_node_replaces() {
    let mut cache = ScheduleCache::new();
    cache.put_node(node(1));
    let mut updated = node(1);
    updated.enabled = false;
    cache.put_node(updated);
    assert_eq!(cache.node(NodeId(1)).map(|n| n.enabled), Some(false));
}

#[test]
fn assocs_index_by_node_and_schedule() {
    let mut cache = ScheduleCache::new();
    cache.put_schedules([schedule(10, "0 0 3 * * *")]);
    cache.put_assocs([assoc(100, 1, 10), assoc(101, 2, 10), assoc(102, 1, 11)]);

    let for_node: Vec<_> =
        cache.assocs_for_node(NodeId(1)).iter().map(|a| a.node_schedule_id).collect();
    assert_eq!(for_node, vec![NodeScheduleId(100), NodeScheduleId(102)]);

    let for_sched: Vec<_> =
        cache.assocs_for_schedule(ScheduleId(10)).iter().map(|a| a.node_schedule_id).collect();
    assert_eq!(for_sched, vec![NodeScheduleId(100), NodeScheduleId(101)]);
}

#[test]
fn remove_assocs_cleans_both_indexes() {
    let mut cache = ScheduleCache::new();
    cache.put_assocs([assoc(100, 1, 10), assoc(101, 1, 10)]);
    cache.remove_assocs(&[NodeScheduleId(100)]);

    assert_eq!(cache.assocs_for_node(NodeId(1)).len(), 1);
    assert_eq!(cache.assocs_for_schedule(ScheduleId(10)).len(), 1);
    // Removing something already gone is fine.
    cache.remove_assocs(&[NodeScheduleId(100)]);
}

#[test]
fn schedules_round_trip() {
    let mut cache = ScheduleCache::new();
    cache.put_schedule(schedule(10, "0 0 3 * * *"));
    assert_eq!(
        cache.schedule(ScheduleId(10)).map(|s| s.cron_expression.as_str()),
        Some("0 0 3 * * *")
    );
    assert!(cache.schedule(ScheduleId(11)).is_none());
}
