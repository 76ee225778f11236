// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! baton-conductor: the conductor core.
//!
//! One logical single-writer event loop owns every mutation of
//! execution state; agents, timers, and tickers feed it through
//! channels. See [`runtime::Runtime`] for the controller and
//! [`conductor`] for the loop and task spawns.

pub mod cache;
pub mod conductor;
pub mod config;
pub mod error;
pub mod notify;
pub mod publisher;
pub mod setup;
pub mod timer;
pub mod tracker;
pub mod transport;

pub mod runtime;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cache::ScheduleCache;
pub use config::Config;
pub use error::{BootstrapError, RuntimeError};
pub use notify::{MailNotifier, Notifier, NotifyError};
pub use runtime::{ControlRequest, Input, Runtime, RuntimeDeps, Settings};
pub use timer::{CronTimerSource, TimerError, TimerSource};
pub use tracker::{AgentTracker, Selection};
pub use transport::{NatsTransport, Transport, TransportError};
