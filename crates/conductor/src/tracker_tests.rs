// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use baton_core::NodeId;
use yare::parameterized;

fn agent(name: &str) -> AgentId {
    AgentId::new(name)
}

fn v(id: i64) -> ExecVertexId {
    ExecVertexId(id)
}

fn job() -> JobRecord {
    JobRecord {
        node_id: NodeId(1),
        name: "job".into(),
        command_line: "true".into(),
        execution_directory: "/".into(),
        agent_affinity: None,
        max_retries: 0,
        max_concurrent: 1,
        timeout_ms: None,
    }
}

fn job_with_affinity(names: &[&str]) -> JobRecord {
    let mut j = job();
    j.agent_affinity = Some(names.iter().map(|n| agent(n)).collect());
    j
}

fn tracker() -> AgentTracker {
    AgentTracker::with_selection(Selection::Deterministic)
}

#[test]
fn registration_and_lookup() {
    let mut t = tracker();
    assert!(!t.agent_exists(&agent("w1")));
    t.add_agent(agent("w1"), 100);
    assert!(t.agent_exists(&agent("w1")));
    assert_eq!(t.agents(), BTreeSet::from([agent("w1")]));
    t.remove_agent(&agent("w1"));
    assert!(!t.agent_exists(&agent("w1")));
}

#[test]
fn re_registration_resets_assignments() {
    let mut t = tracker();
    t.add_agent(agent("w1"), 100);
    t.assign_job(&agent("w1"), v(5), 110);
    assert_eq!(t.running_count(&agent("w1")), 1);
    t.add_agent(agent("w1"), 200);
    assert_eq!(t.running_count(&agent("w1")), 0);
}

#[test]
fn heartbeat_refreshes_only_known_agents() {
    let mut t = tracker();
    assert!(!t.heartbeat(&agent("w1"), 100));
    t.add_agent(agent("w1"), 100);
    assert!(t.heartbeat(&agent("w1"), 200));
    assert!(t.dead_since(150).is_empty());
}

#[test]
fn dead_since_reports_stale_agents_with_their_vertices() {
    let mut t = tracker();
    t.add_agent(agent("old"), 100);
    t.add_agent(agent("fresh"), 500);
    t.assign_job(&agent("old"), v(1), 100);
    t.assign_job(&agent("old"), v(2), 100);

    let dead = t.dead_since(400);
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[&agent("old")], BTreeSet::from([v(1), v(2)]));

    t.remove_agents(dead.keys());
    assert!(!t.agent_exists(&agent("old")));
    assert!(t.agent_exists(&agent("fresh")));
}

#[test]
fn assignments_clear_on_completion() {
    let mut t = tracker();
    t.add_agent(agent("w1"), 100);
    t.assign_job(&agent("w1"), v(1), 100);
    t.clear_job(&agent("w1"), v(1));
    assert_eq!(t.running_count(&agent("w1")), 0);
}

#[test]
fn take_assignments_collects_and_clears() {
    let mut t = tracker();
    t.add_agent(agent("w1"), 100);
    t.add_agent(agent("w2"), 100);
    t.assign_job(&agent("w1"), v(1), 100);
    t.assign_job(&agent("w2"), v(2), 100);
    t.assign_job(&agent("w2"), v(3), 100);

    let taken = t.take_assignments(&HashSet::from([v(1), v(2)]));
    assert_eq!(taken.len(), 2);
    assert_eq!(t.running_count(&agent("w1")), 0);
    assert_eq!(t.running_count(&agent("w2")), 1);
}

#[test]
fn pick_agent_prefers_least_loaded() {
    let mut t = tracker();
    t.add_agent(agent("busy"), 100);
    t.add_agent(agent("idle"), 100);
    t.assign_job(&agent("busy"), v(1), 100);

    assert_eq!(t.pick_agent(&job(), None), Some(agent("idle")));
}

#[test]
fn pick_agent_honors_affinity() {
    let mut t = tracker();
    t.add_agent(agent("a"), 100);
    t.add_agent(agent("b"), 100);
    t.assign_job(&agent("b"), v(1), 100);

    // b is busier, but the job only runs on b.
    assert_eq!(t.pick_agent(&job_with_affinity(&["b"]), None), Some(agent("b")));
    assert_eq!(t.pick_agent(&job_with_affinity(&["ghost"]), None), None);
}

#[parameterized(
    at_cap = { Some(2), false },
    under_cap = { Some(3), true },
    uncapped = { None, true },
)]
fn pick_agent_honors_per_agent_cap(cap: Option<u32>, eligible: bool) {
    let mut t = tracker();
    t.add_agent(agent("a"), 100);
    t.assign_job(&agent("a"), v(1), 100);
    t.assign_job(&agent("a"), v(2), 100);

    let expected = if eligible { Some(agent("a")) } else { None };
    assert_eq!(t.pick_agent(&job(), cap), expected);
}

#[test]
fn pick_agent_is_deterministic_on_ties() {
    let mut t = tracker();
    t.add_agent(agent("bb"), 100);
    t.add_agent(agent("aa"), 100);
    assert_eq!(t.pick_agent(&job(), None), Some(agent("aa")));
}

#[test]
fn pick_agent_with_no_agents_is_none() {
    let t = tracker();
    assert_eq!(t.pick_agent(&job(), None), None);
}

#[test]
fn random_selection_picks_some_candidate() {
    let mut t = AgentTracker::new();
    t.add_agent(agent("a"), 100);
    t.add_agent(agent("b"), 100);
    let picked = t.pick_agent(&job(), None);
    assert!(picked == Some(agent("a")) || picked == Some(agent("b")));
}
