// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dead-agent quarantine and re-registration.

use super::*;
use crate::test_support::TestConductor;
use baton_core::AgentId;
use baton_wire::{FromAgent, ToAgent, Topic};
use std::time::Duration;

#[tokio::test]
async fn stale_agent_is_quarantined_and_its_vertices_marked_unknown() {
    let mut ctx = TestConductor::new();
    let agent = ctx.register_agent("w1").await.unwrap();
    let node = chain_workflow(&ctx, "slow", &["a"]);

    ctx.trigger(node).await.unwrap();
    let a = ctx.next_run_job().unwrap();
    ctx.ack_job(&a).await.unwrap();
    ctx.drain_events();

    // The agent goes silent past the dead-after threshold.
    ctx.clock.advance(Duration::from_secs(120));
    ctx.handle(crate::runtime::Input::WatchdogTick).await.unwrap();

    // The vertex is unknown (not failed): the job may still be running.
    let row = ctx.store.vertex(a.exec_vertex_id).await.unwrap().unwrap();
    assert_eq!(row.status, RunStatus::Unknown);

    // The agent is gone and operators were told.
    let dead = ctx.notifier.dead.lock().clone();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].keys().collect::<Vec<_>>(), vec![&agent]);
    assert!(dead[0][&agent].contains(&a.exec_vertex_id));

    // No execution-finished came out of this alone.
    assert!(ctx.drain_events().is_empty());
    assert!(ctx.runtime.is_live(a.execution_id));
}

#[tokio::test]
async fn returning_agent_is_asked_to_re_register() {
    let mut ctx = TestConductor::new();
    let agent = ctx.register_agent("w1").await.unwrap();

    ctx.clock.advance(Duration::from_secs(120));
    ctx.handle(crate::runtime::Input::WatchdogTick).await.unwrap();
    ctx.transport.take_sent();

    // A later heartbeat-ack from the quarantined agent triggers
    // agents-register on its topic.
    ctx.handle(crate::runtime::Input::Agent(FromAgent::HeartbeatAck {
        agent_id: agent.clone(),
    }))
    .await
    .unwrap();

    let sent = ctx.transport.take_agent_messages();
    assert!(sent
        .iter()
        .any(|(t, m)| *t == Topic::Agent(agent.clone()) && *m == ToAgent::AgentsRegister));
    ctx.drain_events();
}

#[tokio::test]
async fn live_agents_survive_the_watchdog() {
    let ctx = TestConductor::new();
    let agent = ctx.register_agent("w1").await.unwrap();

    ctx.clock.advance(Duration::from_secs(30));
    ctx.handle(crate::runtime::Input::Agent(FromAgent::HeartbeatAck {
        agent_id: agent.clone(),
    }))
    .await
    .unwrap();

    ctx.clock.advance(Duration::from_secs(45));
    ctx.handle(crate::runtime::Input::WatchdogTick).await.unwrap();

    // Heartbeat 45s ago, threshold 60s: still alive.
    assert!(ctx.notifier.dead.lock().is_empty());
    assert!(ctx.runtime.tracker.lock().agent_exists(&agent));
}

#[tokio::test]
async fn heartbeat_tick_broadcasts() {
    let ctx = TestConductor::new();
    ctx.handle(crate::runtime::Input::HeartbeatTick).await.unwrap();
    let sent = ctx.transport.take_agent_messages();
    assert_eq!(sent, vec![(Topic::Broadcast, ToAgent::Heartbeat)]);
}

#[tokio::test]
async fn ping_gets_a_pong_on_the_reply_topic() {
    let ctx = TestConductor::new();
    ctx.handle(crate::runtime::Input::Agent(FromAgent::Ping {
        reply_to: AgentId::new("w9"),
    }))
    .await
    .unwrap();
    let sent = ctx.transport.take_agent_messages();
    assert_eq!(
        sent,
        vec![(Topic::Agent(AgentId::new("w9")), ToAgent::Pong { reply_to: "w9".into() })]
    );
}
