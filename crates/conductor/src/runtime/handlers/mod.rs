// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handling for the controller.

mod agent;
mod completion;
mod control;
mod trigger;

pub(crate) use completion::JobOutcome;

use super::{ControlRequest, Runtime};
use crate::error::RuntimeError;
use crate::notify::Notifier;
use crate::transport::Transport;
use baton_core::Clock;
use baton_wire::FromAgent;

impl<T, N, C> Runtime<T, N, C>
where
    T: Transport,
    N: Notifier,
    C: Clock,
{
    /// Route one inbound agent message to its handler.
    pub async fn handle_agent_message(&self, msg: FromAgent) -> Result<(), RuntimeError> {
        tracing::debug!(kind = msg.kind(), "agent message");
        match msg {
            FromAgent::AgentRegistering { agent_id } => {
                self.handle_agent_registering(agent_id).await
            }

            FromAgent::HeartbeatAck { agent_id } => self.handle_heartbeat_ack(agent_id).await,

            FromAgent::RunJobAck { execution_id, exec_vertex_id, exec_wf_id, agent_id } => {
                self.handle_run_job_ack(execution_id, exec_vertex_id, exec_wf_id, agent_id).await
            }

            FromAgent::JobFinished {
                execution_id,
                exec_vertex_id,
                exec_wf_id,
                agent_id,
                success,
                status,
                error_msg,
                forced_by_conductor,
            } => {
                self.job_finished(JobOutcome {
                    execution_id,
                    exec_vertex_id,
                    exec_wf_id,
                    agent_id,
                    success,
                    status,
                    error_msg,
                    forced: forced_by_conductor,
                })
                .await
            }

            FromAgent::Ping { reply_to } => self.handle_ping(reply_to).await,
        }
    }

    /// Route one control request to its handler.
    pub async fn handle_control(&self, req: ControlRequest) -> Result<(), RuntimeError> {
        match req {
            ControlRequest::NodeSave { node_id } => self.handle_node_save(node_id).await,
            ControlRequest::ScheduleSave { schedule_id } => {
                self.handle_schedule_save(schedule_id).await
            }
            ControlRequest::ScheduleAssoc { node_id } => {
                self.handle_schedule_assoc(node_id).await
            }
            ControlRequest::TriggerNode { node_id } => self.trigger_node(node_id).await,
            ControlRequest::AbortExecution { execution_id } => {
                self.abort_execution(execution_id).await
            }
            ControlRequest::ResumeExecution { execution_id, exec_vertex_id } => {
                self.resume_execution(execution_id, exec_vertex_id).await
            }
        }
    }
}
