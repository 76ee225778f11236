// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn events_carry_the_kind_discriminator() {
    let ev = StatusEvent::ExecutionStarted {
        execution_id: ExecutionId(5),
        name: "nightly-build".into(),
        start_ts: 1_000,
    };
    let value = serde_json::to_value(&ev).unwrap();
    assert_eq!(
        value,
        json!({
            "event": "execution-started",
            "execution-id": 5,
            "name": "nightly-build",
            "start-ts": 1_000,
        })
    );
}

#[test]
fn job_finished_round_trips() {
    let ev = StatusEvent::JobFinished {
        execution_id: ExecutionId(5),
        exec_vertex_id: ExecVertexId(9),
        success: false,
        status: RunStatus::FinishedError,
    };
    let s = serde_json::to_string(&ev).unwrap();
    let back: StatusEvent = serde_json::from_str(&s).unwrap();
    assert_eq!(back, ev);
}

#[test]
fn wf_finished_uses_kebab_case_fields() {
    let ev = StatusEvent::WfFinished {
        execution_id: ExecutionId(1),
        exec_wf_id: ExecWorkflowId(2),
        vertices: vec![ExecVertexId(3)],
        success: true,
    };
    let value = serde_json::to_value(&ev).unwrap();
    assert_eq!(value["event"], "wf-finished");
    assert_eq!(value["exec-wf-id"], 2);
    assert_eq!(value["vertices"], json!([3]));
}

#[test]
fn log_summary_names_the_kind() {
    let ev = StatusEvent::WfStarted { execution_id: ExecutionId(1), exec_wf_id: ExecWorkflowId(2) };
    assert_eq!(ev.log_summary(), "wf-started exec=1 wf=2");
    assert_eq!(ev.execution_id(), ExecutionId(1));
}
