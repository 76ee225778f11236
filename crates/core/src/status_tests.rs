// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    unexecuted = { RunStatus::Unexecuted, 1 },
    started = { RunStatus::Started, 2 },
    finished_success = { RunStatus::FinishedSuccess, 3 },
    finished_error = { RunStatus::FinishedError, 4 },
    aborted = { RunStatus::Aborted, 5 },
    unknown = { RunStatus::Unknown, 6 },
    pending = { RunStatus::Pending, 7 },
)]
fn status_codes_are_fixed(status: RunStatus, code: i16) {
    assert_eq!(status.code(), code);
    assert_eq!(RunStatus::from_code(code), Some(status));
}

#[test]
fn unknown_code_is_rejected() {
    assert_eq!(RunStatus::from_code(0), None);
    assert_eq!(RunStatus::from_code(8), None);
    assert!(serde_json::from_str::<RunStatus>("99").is_err());
}

#[test]
fn statuses_serialize_as_codes() {
    assert_eq!(serde_json::to_string(&RunStatus::FinishedError).unwrap(), "4");
    let back: RunStatus = serde_json::from_str("6").unwrap();
    assert_eq!(back, RunStatus::Unknown);
}

#[parameterized(
    unexecuted = { RunStatus::Unexecuted, false },
    started = { RunStatus::Started, false },
    pending = { RunStatus::Pending, false },
    finished_success = { RunStatus::FinishedSuccess, true },
    finished_error = { RunStatus::FinishedError, true },
    aborted = { RunStatus::Aborted, true },
    unknown = { RunStatus::Unknown, true },
)]
fn terminal_statuses(status: RunStatus, terminal: bool) {
    assert_eq!(status.is_terminal(), terminal);
}

#[test]
fn finished_maps_outcome_to_status() {
    assert_eq!(RunStatus::finished(true), RunStatus::FinishedSuccess);
    assert_eq!(RunStatus::finished(false), RunStatus::FinishedError);
}

#[test]
fn node_type_codes() {
    assert_eq!(NodeType::Job.code(), 1);
    assert_eq!(NodeType::Workflow.code(), 2);
    assert_eq!(NodeType::from_code(2), Some(NodeType::Workflow));
    assert_eq!(NodeType::from_code(3), None);
}
