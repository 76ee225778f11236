// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory registry of live agents.
//!
//! Tracks the last heartbeat and the in-flight vertices of every agent,
//! and picks the target agent for each dispatched job. Owned by the
//! controller; no I/O happens here.

use baton_core::{AgentId, ExecVertexId};
use baton_store::JobRecord;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// How ties between equally loaded agents are broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Random,
    /// Lowest agent id wins. Used by tests.
    Deterministic,
}

#[derive(Debug, Clone)]
struct AgentEntry {
    last_heartbeat_ms: u64,
    running: BTreeSet<ExecVertexId>,
}

/// Registry of live agents and their assignments.
#[derive(Debug)]
pub struct AgentTracker {
    agents: BTreeMap<AgentId, AgentEntry>,
    selection: Selection,
}

impl Default for AgentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentTracker {
    pub fn new() -> Self {
        Self::with_selection(Selection::Random)
    }

    pub fn with_selection(selection: Selection) -> Self {
        Self { agents: BTreeMap::new(), selection }
    }

    /// Register an agent. Re-registration resets it to a fresh entry
    /// with zero assignments.
    pub fn add_agent(&mut self, id: AgentId, ts: u64) {
        self.agents
            .insert(id, AgentEntry { last_heartbeat_ms: ts, running: BTreeSet::new() });
    }

    pub fn remove_agent(&mut self, id: &AgentId) {
        self.agents.remove(id);
    }

    pub fn remove_agents<'a>(&mut self, ids: impl IntoIterator<Item = &'a AgentId>) {
        for id in ids {
            self.agents.remove(id);
        }
    }

    /// Record a heartbeat-ack. Returns false when the agent is unknown.
    pub fn heartbeat(&mut self, id: &AgentId, ts: u64) -> bool {
        match self.agents.get_mut(id) {
            Some(entry) => {
                entry.last_heartbeat_ms = ts;
                true
            }
            None => false,
        }
    }

    /// Record that a vertex was dispatched to an agent.
    pub fn assign_job(&mut self, id: &AgentId, vertex: ExecVertexId, ts: u64) {
        if let Some(entry) = self.agents.get_mut(id) {
            entry.running.insert(vertex);
            entry.last_heartbeat_ms = ts;
        }
    }

    /// Record an agent's run-job-ack. The assignment usually already
    /// exists from dispatch; this re-adds it after a re-registration.
    pub fn agent_started_job(&mut self, id: &AgentId, vertex: ExecVertexId, ts: u64) {
        self.assign_job(id, vertex, ts);
    }

    pub fn clear_job(&mut self, id: &AgentId, vertex: ExecVertexId) {
        if let Some(entry) = self.agents.get_mut(id) {
            entry.running.remove(&vertex);
        }
    }

    pub fn agents(&self) -> BTreeSet<AgentId> {
        self.agents.keys().cloned().collect()
    }

    pub fn agent_exists(&self, id: &AgentId) -> bool {
        self.agents.contains_key(id)
    }

    pub fn running_count(&self, id: &AgentId) -> usize {
        self.agents.get(id).map(|e| e.running.len()).unwrap_or(0)
    }

    /// Agents whose last heartbeat predates `threshold_ts`, with their
    /// in-flight vertices. Does not remove them.
    pub fn dead_since(&self, threshold_ts: u64) -> BTreeMap<AgentId, BTreeSet<ExecVertexId>> {
        self.agents
            .iter()
            .filter(|(_, e)| e.last_heartbeat_ms < threshold_ts)
            .map(|(id, e)| (id.clone(), e.running.clone()))
            .collect()
    }

    /// Remove and return every assignment for the given vertices
    /// (execution abort).
    pub fn take_assignments(
        &mut self,
        vertices: &HashSet<ExecVertexId>,
    ) -> Vec<(AgentId, ExecVertexId)> {
        let mut taken = Vec::new();
        for (id, entry) in self.agents.iter_mut() {
            let held: Vec<ExecVertexId> =
                entry.running.iter().filter(|v| vertices.contains(v)).copied().collect();
            for v in held {
                entry.running.remove(&v);
                taken.push((id.clone(), v));
            }
        }
        taken
    }

    /// Choose the agent for a job.
    ///
    /// Affinity filters first when the job carries one, then agents at
    /// the per-agent concurrency cap drop out, and the least loaded of
    /// the rest wins. Ties break randomly (or by id in deterministic
    /// mode). None when no candidate survives.
    pub fn pick_agent(&self, job: &JobRecord, per_agent_cap: Option<u32>) -> Option<AgentId> {
        let affinity: Option<HashSet<&AgentId>> =
            job.agent_affinity.as_ref().map(|ids| ids.iter().collect());

        let candidates: Vec<(&AgentId, usize)> = self
            .agents
            .iter()
            .filter(|(id, _)| affinity.as_ref().map_or(true, |set| set.contains(id)))
            .map(|(id, e)| (id, e.running.len()))
            .filter(|(_, load)| per_agent_cap.map_or(true, |cap| *load < cap as usize))
            .collect();

        let min_load = candidates.iter().map(|(_, load)| *load).min()?;
        let least_loaded: Vec<&AgentId> = candidates
            .into_iter()
            .filter(|(_, load)| *load == min_load)
            .map(|(id, _)| id)
            .collect();

        match self.selection {
            Selection::Deterministic => least_loaded.first().map(|id| (*id).clone()),
            Selection::Random => {
                least_loaded.choose(&mut rand::thread_rng()).map(|id| (*id).clone())
            }
        }
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
