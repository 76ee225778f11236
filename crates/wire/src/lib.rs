// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent wire protocol for conductor↔agent messaging.
//!
//! Wire format: a topic (agent id, `broadcast`, or `status-updates`)
//! plus a self-describing JSON payload tagged with `msg`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod from_agent;
mod to_agent;
mod topic;
mod wire;

pub use from_agent::FromAgent;
pub use to_agent::{JobSpec, ToAgent, TIMEOUT_NONE};
pub use topic::Topic;
pub use wire::{decode, encode, ProtocolError};
