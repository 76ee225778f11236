// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes.
//!
//! Every persisted entity carries a stable positive integer id minted by
//! the store. Agents are the exception: they introduce themselves by name
//! over the wire, so [`AgentId`] wraps the self-reported string.

crate::define_int_id! {
    /// Identifier of a scheduling target (a job or a workflow).
    pub struct NodeId;
}

crate::define_int_id! {
    /// Identifier of a workflow template. Workflow templates are nodes,
    /// so this shares the id space of [`NodeId`].
    pub struct WorkflowId;
}

crate::define_int_id! {
    /// Identifier of one vertex inside a workflow template.
    pub struct WorkflowVertexId;
}

crate::define_int_id! {
    /// Identifier of a cron schedule.
    pub struct ScheduleId;
}

crate::define_int_id! {
    /// Identifier of a node↔schedule association.
    pub struct NodeScheduleId;
}

crate::define_int_id! {
    /// Identifier of one run of a root workflow.
    pub struct ExecutionId;
}

crate::define_int_id! {
    /// Identifier of the execution-time projection of one workflow
    /// template inside an execution.
    pub struct ExecWorkflowId;
}

crate::define_int_id! {
    /// Identifier of the execution-time projection of one workflow vertex.
    pub struct ExecVertexId;
}

/// Self-reported name of a remote worker process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Reserved sender id for job-finished messages the conductor
    /// synthesizes itself (no eligible agent).
    pub const CONDUCTOR: &'static str = "conductor";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The conductor's own sender id.
    pub fn conductor() -> Self {
        Self(Self::CONDUCTOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
