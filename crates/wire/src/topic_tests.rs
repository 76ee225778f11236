// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn subjects_nest_under_the_prefix() {
    assert_eq!(Topic::Agent(AgentId::new("w1")).subject("baton"), "baton.agent.w1");
    assert_eq!(Topic::Broadcast.subject("baton"), "baton.broadcast");
    assert_eq!(Topic::StatusUpdates.subject("baton"), "baton.status-updates");
    assert_eq!(Topic::conductor_inbox("baton"), "baton.conductor");
}

#[test]
fn display_matches_the_topic_names() {
    assert_eq!(Topic::Broadcast.to_string(), "broadcast");
    assert_eq!(Topic::StatusUpdates.to_string(), "status-updates");
    assert_eq!(Topic::Agent(AgentId::new("w1")).to_string(), "w1");
}
