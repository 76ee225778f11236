// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory cache of nodes, schedules, and their associations.
//!
//! Written only from the controller loop in response to `node-save`,
//! `schedule-save`, and `schedule-assoc` messages; read from that same
//! loop when triggers fire.

use baton_core::{NodeId, NodeScheduleId, ScheduleId};
use baton_store::{NodeRecord, NodeScheduleRecord, ScheduleRecord};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct ScheduleCache {
    nodes: HashMap<NodeId, NodeRecord>,
    schedules: HashMap<ScheduleId, ScheduleRecord>,
    assocs: HashMap<NodeScheduleId, NodeScheduleRecord>,
    by_node: HashMap<NodeId, BTreeSet<NodeScheduleId>>,
    by_schedule: HashMap<ScheduleId, BTreeSet<NodeScheduleId>>,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_node(&mut self, node: NodeRecord) {
        self.nodes.insert(node.node_id, node);
    }

    pub fn put_nodes(&mut self, nodes: impl IntoIterator<Item = NodeRecord>) {
        for node in nodes {
            self.put_node(node);
        }
    }

    pub fn remove_node(&mut self, id: NodeId) {
        self.nodes.remove(&id);
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(&id)
    }

    pub fn put_schedule(&mut self, schedule: ScheduleRecord) {
        self.schedules.insert(schedule.schedule_id, schedule);
    }

    pub fn put_schedules(&mut self, schedules: impl IntoIterator<Item = ScheduleRecord>) {
        for schedule in schedules {
            self.put_schedule(schedule);
        }
    }

    pub fn schedule(&self, id: ScheduleId) -> Option<&ScheduleRecord> {
        self.schedules.get(&id)
    }

    pub fn put_assocs(&mut self, assocs: impl IntoIterator<Item = NodeScheduleRecord>) {
        for assoc in assocs {
            let id = assoc.node_schedule_id;
            self.by_node.entry(assoc.node_id).or_default().insert(id);
            self.by_schedule.entry(assoc.schedule_id).or_default().insert(id);
            self.assocs.insert(id, assoc);
        }
    }

    pub fn remove_assocs(&mut self, ids: &[NodeScheduleId]) {
        for id in ids {
            if let Some(assoc) = self.assocs.remove(id) {
                if let Some(set) = self.by_node.get_mut(&assoc.node_id) {
                    set.remove(id);
                }
                if let Some(set) = self.by_schedule.get_mut(&assoc.schedule_id) {
                    set.remove(id);
                }
            }
        }
    }

    pub fn assocs_for_node(&self, id: NodeId) -> Vec<NodeScheduleRecord> {
        self.collect(self.by_node.get(&id))
    }

    pub fn assocs_for_schedule(&self, id: ScheduleId) -> Vec<NodeScheduleRecord> {
        self.collect(self.by_schedule.get(&id))
    }

    fn collect(&self, ids: Option<&BTreeSet<NodeScheduleId>>) -> Vec<NodeScheduleRecord> {
        ids.map(|set| set.iter().filter_map(|id| self.assocs.get(id)).cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
