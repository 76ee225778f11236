// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run statuses and node types with their fixed store codes.
//!
//! The integer codes are part of the persistent schema and the wire
//! protocol; they never change meaning.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Status of an execution, exec-workflow, or exec-vertex.
///
/// Progression for a vertex: `Unexecuted → Started → (FinishedSuccess |
/// FinishedError | Aborted | Unknown)`. Terminal statuses are never
/// re-entered within the same execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Unexecuted,
    Started,
    FinishedSuccess,
    FinishedError,
    Aborted,
    /// The owning agent died; the job may still be running on its host.
    Unknown,
    Pending,
}

impl RunStatus {
    /// Fixed store code.
    pub fn code(&self) -> i16 {
        match self {
            RunStatus::Unexecuted => 1,
            RunStatus::Started => 2,
            RunStatus::FinishedSuccess => 3,
            RunStatus::FinishedError => 4,
            RunStatus::Aborted => 5,
            RunStatus::Unknown => 6,
            RunStatus::Pending => 7,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(RunStatus::Unexecuted),
            2 => Some(RunStatus::Started),
            3 => Some(RunStatus::FinishedSuccess),
            4 => Some(RunStatus::FinishedError),
            5 => Some(RunStatus::Aborted),
            6 => Some(RunStatus::Unknown),
            7 => Some(RunStatus::Pending),
            _ => None,
        }
    }

    /// Whether this status ends a vertex's life within the execution.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::FinishedSuccess
                | RunStatus::FinishedError
                | RunStatus::Aborted
                | RunStatus::Unknown
        )
    }

    /// Terminal status for a job outcome.
    pub fn finished(success: bool) -> Self {
        if success {
            RunStatus::FinishedSuccess
        } else {
            RunStatus::FinishedError
        }
    }
}

crate::simple_display! {
    RunStatus {
        Unexecuted => "unexecuted",
        Started => "started",
        FinishedSuccess => "finished-success",
        FinishedError => "finished-error",
        Aborted => "aborted",
        Unknown => "unknown",
        Pending => "pending",
    }
}

impl Serialize for RunStatus {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i16(self.code())
    }
}

impl<'de> Deserialize<'de> for RunStatus {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let code = i16::deserialize(d)?;
        RunStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown status code: {code}")))
    }
}

/// Kind of a scheduling target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Job,
    Workflow,
}

impl NodeType {
    pub fn code(&self) -> i16 {
        match self {
            NodeType::Job => 1,
            NodeType::Workflow => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(NodeType::Job),
            2 => Some(NodeType::Workflow),
            _ => None,
        }
    }
}

crate::simple_display! {
    NodeType {
        Job => "job",
        Workflow => "workflow",
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i16(self.code())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let code = i16::deserialize(d)?;
        NodeType::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown node type code: {code}")))
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
