// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_finished_defaults_forced_to_false() {
    // Agents never send the forced marker; only conductor-synthesized
    // messages carry it.
    let json = r#"{"msg":"job-finished","execution-id":1,"exec-vertex-id":2,
        "exec-wf-id":3,"agent-id":"worker-1","success":true,"status":3}"#;
    let decoded: FromAgent = serde_json::from_str(json).unwrap();
    match decoded {
        FromAgent::JobFinished { forced_by_conductor, error_msg, success, status, .. } => {
            assert!(!forced_by_conductor);
            assert!(error_msg.is_none());
            assert!(success);
            assert_eq!(status, RunStatus::FinishedSuccess);
        }
        other => panic!("expected job-finished, got {other:?}"),
    }
}

#[test]
fn registering_carries_the_agent_id() {
    let json = r#"{"msg":"agent-registering","agent-id":"worker-9"}"#;
    let decoded: FromAgent = serde_json::from_str(json).unwrap();
    assert_eq!(decoded, FromAgent::AgentRegistering { agent_id: AgentId::new("worker-9") });
    assert_eq!(decoded.kind(), "agent-registering");
}

#[test]
fn forced_marker_is_skipped_when_false() {
    let msg = FromAgent::JobFinished {
        execution_id: ExecutionId(1),
        exec_vertex_id: ExecVertexId(2),
        exec_wf_id: ExecWorkflowId(3),
        agent_id: AgentId::new("worker-1"),
        success: false,
        status: RunStatus::FinishedError,
        error_msg: Some("exit 2".into()),
        forced_by_conductor: false,
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert!(value.get("forced-by-conductor").is_none());
    assert_eq!(value["error-msg"], "exit 2");
}
