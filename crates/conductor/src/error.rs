// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the conductor crate.

use crate::config::ConfigError;
use crate::notify::NotifyError;
use crate::timer::TimerError;
use crate::transport::TransportError;
use baton_core::{ExecVertexId, ExecutionId, ModelError, NodeId};
use baton_store::StoreError;
use baton_wire::ProtocolError;
use thiserror::Error;

/// Errors surfaced by controller handlers.
///
/// The event loop logs these and keeps running; none of them unwind the
/// process.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("timer error: {0}")]
    Timer(#[from] TimerError),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node {0} is disabled")]
    NodeDisabled(NodeId),

    #[error("job {0} not found")]
    JobNotFound(NodeId),

    #[error("execution {0} not found")]
    ExecutionNotFound(ExecutionId),

    #[error("execution {0} is already live")]
    ExecutionAlreadyLive(ExecutionId),

    #[error("vertex {0} not part of execution {1}")]
    UnknownVertex(ExecVertexId, ExecutionId),

    #[error("workflow vertex {0} has no child execution workflow")]
    MissingChildWorkflow(ExecVertexId),

    #[error("vertices span multiple execution workflows")]
    MixedWorkflowVertices,

    #[error("corrupt workflow template: {0}")]
    CorruptTemplate(String),

    #[error("status channel closed")]
    EventChannelClosed,
}

/// Errors that abort process startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("notifier error: {0}")]
    Notify(#[from] NotifyError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}
