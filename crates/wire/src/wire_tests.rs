// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::FromAgent;
use baton_core::AgentId;

#[test]
fn decode_rejects_garbage() {
    let err = decode::<FromAgent>(b"not json").unwrap_err();
    assert!(matches!(err, ProtocolError::Decode(_)));
}

#[test]
fn decode_rejects_unknown_kinds() {
    let err = decode::<FromAgent>(br#"{"msg":"no-such-kind"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::Decode(_)));
}

#[test]
fn encode_decode_round_trip() {
    let msg = FromAgent::HeartbeatAck { agent_id: AgentId::new("worker-2") };
    let bytes = encode(&msg).unwrap();
    assert_eq!(decode::<FromAgent>(&bytes).unwrap(), msg);
}
