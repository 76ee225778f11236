// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job completion, workflow close-out, and execution finish.

use crate::error::RuntimeError;
use crate::notify::Notifier;
use crate::runtime::Runtime;
use crate::transport::Transport;
use baton_core::{
    AgentId, Clock, ExecVertexId, ExecWorkflowId, ExecutionId, RunStatus, StatusEvent,
};
use baton_wire::ToAgent;

/// Terminal report for one vertex, from an agent or conductor-forced.
#[derive(Debug, Clone)]
pub(crate) struct JobOutcome {
    pub execution_id: ExecutionId,
    pub exec_vertex_id: ExecVertexId,
    pub exec_wf_id: ExecWorkflowId,
    pub agent_id: AgentId,
    pub success: bool,
    pub status: RunStatus,
    pub error_msg: Option<String>,
    pub forced: bool,
}

/// One closed exec-workflow in a parent-chain walk: its outcome plus
/// the workflow vertex that contains it (closed alongside it).
struct ClosedWf {
    exec_wf_id: ExecWorkflowId,
    success: bool,
    containing_vertex: Option<ExecVertexId>,
}

impl<T, N, C> Runtime<T, N, C>
where
    T: Transport,
    N: Notifier,
    C: Clock,
{
    /// Handle an agent's run-job-ack: the job process was forked.
    ///
    /// Idempotent: a repeat delivery finds the vertex already started
    /// and leaves the running-jobs counter alone.
    pub(crate) async fn handle_run_job_ack(
        &self,
        execution_id: ExecutionId,
        exec_vertex_id: ExecVertexId,
        exec_wf_id: ExecWorkflowId,
        agent_id: AgentId,
    ) -> Result<(), RuntimeError> {
        if !self.is_live(execution_id) {
            tracing::warn!(
                execution = %execution_id,
                vertex = %exec_vertex_id,
                "run-job-ack for unknown execution discarded"
            );
            return Ok(());
        }
        let now = self.clock.epoch_ms();
        let transitioned =
            self.store.mark_vertex_started(exec_vertex_id, Some(&agent_id), now).await?;
        if !transitioned {
            tracing::debug!(vertex = %exec_vertex_id, "duplicate run-job-ack ignored");
            return Ok(());
        }

        {
            let mut infos = self.exec_infos.lock();
            if let Some(info) = infos.get_mut(&execution_id) {
                *info.running_jobs.entry(exec_wf_id).or_insert(0) += 1;
            }
        }
        self.tracker.lock().agent_started_job(&agent_id, exec_vertex_id, now);

        self.emit(StatusEvent::JobStarted {
            execution_id,
            exec_vertex_id,
            exec_wf_id,
            agent_id,
        })
        .await
    }

    /// Handle a terminal vertex report and walk the DAG forward.
    ///
    /// Idempotent: the store refuses terminal→terminal transitions, so
    /// a duplicate report is detected at step 1 and the rest skipped.
    /// Reports for purged (aborted, finished) executions are discarded.
    pub(crate) async fn job_finished(&self, outcome: JobOutcome) -> Result<(), RuntimeError> {
        let JobOutcome { execution_id, exec_vertex_id, exec_wf_id, .. } = outcome;
        let Ok(model) = self.model(execution_id) else {
            tracing::warn!(
                execution = %execution_id,
                vertex = %exec_vertex_id,
                "job-finished for unknown execution discarded"
            );
            return Ok(());
        };
        if let Some(err) = &outcome.error_msg {
            tracing::warn!(
                execution = %execution_id,
                vertex = %exec_vertex_id,
                agent = %outcome.agent_id,
                error = %err,
                "job reported an error"
            );
        }

        // 1. Persist the terminal status.
        let now = self.clock.epoch_ms();
        let status = if outcome.status.is_terminal() {
            outcome.status
        } else {
            RunStatus::finished(outcome.success)
        };
        let transitioned = self.store.finalize_vertex(exec_vertex_id, status, now).await?;
        if !transitioned {
            tracing::info!(vertex = %exec_vertex_id, "duplicate job-finished ignored");
            return Ok(());
        }

        // 2. Release the agent; it drops its local state on the ack.
        if !outcome.forced {
            self.tracker.lock().clear_job(&outcome.agent_id, exec_vertex_id);
            self.send_to_agent(
                &outcome.agent_id,
                &ToAgent::JobFinishedAck { execution_id, exec_vertex_id },
            )
            .await?;
        }

        // 3..5. Counter, successor set, failure marking.
        let next = model.dependencies(exec_vertex_id, outcome.success);
        let (running, scheduled) = {
            let mut infos = self.exec_infos.lock();
            match infos.get_mut(&execution_id) {
                Some(info) => {
                    if !outcome.forced {
                        let counter = info.running_jobs.entry(exec_wf_id).or_insert(0);
                        *counter = counter.saturating_sub(1);
                    }
                    if let Some(set) = info.in_flight.get_mut(&exec_wf_id) {
                        set.remove(&exec_vertex_id);
                    }
                    if !outcome.success && next.is_empty() {
                        info.failed_wfs.insert(exec_wf_id);
                    }
                    (
                        info.running_jobs.get(&exec_wf_id).copied().unwrap_or(0),
                        info.in_flight.get(&exec_wf_id).map(|s| s.len()).unwrap_or(0),
                    )
                }
                None => return Ok(()),
            }
        };

        // 6. Tell the UI.
        self.emit(StatusEvent::JobFinished {
            execution_id,
            exec_vertex_id,
            success: outcome.success,
            status,
        })
        .await?;

        // 7. Close the exec-workflow or keep walking the DAG. Siblings
        // from the same batch may still be scheduled (dispatched but
        // unacked jobs, open child workflows); the workflow stays open
        // until the last of them reaches a terminal state.
        if running == 0 && scheduled == 0 && next.is_empty() {
            self.when_wf_finished(execution_id, exec_wf_id, model.containing_vertex(exec_wf_id))
                .await
        } else {
            self.run_nodes(execution_id, next).await
        }
    }

    /// Close a finished exec-workflow and propagate up the nesting.
    ///
    /// The containing workflow vertex always finalizes with the child
    /// outcome. The walk continues into the parent exec-workflow only
    /// while that vertex has no successors for the outcome and its
    /// exec-workflow has nothing left running or scheduled.
    pub(crate) async fn when_wf_finished(
        &self,
        execution_id: ExecutionId,
        exec_wf_id: ExecWorkflowId,
        containing_vertex: Option<ExecVertexId>,
    ) -> Result<(), RuntimeError> {
        let model = self.model(execution_id)?;
        let now = self.clock.epoch_ms();

        let mut outcome = {
            let infos = self.exec_infos.lock();
            let failed = infos
                .get(&execution_id)
                .map(|i| i.failed_wfs.contains(&exec_wf_id))
                .unwrap_or(false);
            !failed
        };
        let mut chain = vec![ClosedWf { exec_wf_id, success: outcome, containing_vertex }];
        let mut chain_top: Option<(ExecVertexId, bool)> = None;

        let mut cursor = containing_vertex;
        while let Some(parent) = cursor {
            let parent_wf = model
                .vertex_attrs(parent)
                .map(|a| a.exec_wf_id)
                .ok_or(RuntimeError::UnknownVertex(parent, execution_id))?;
            // The parent vertex finalizes now, whichever way the walk
            // ends below; its workflow no longer waits on it.
            {
                let mut infos = self.exec_infos.lock();
                if let Some(info) = infos.get_mut(&execution_id) {
                    if let Some(set) = info.in_flight.get_mut(&parent_wf) {
                        set.remove(&parent);
                    }
                }
            }
            let successors = model.dependencies(parent, outcome);
            if !successors.is_empty() {
                chain_top = Some((parent, outcome));
                break;
            }

            // No successors: the parent's failure (if any) has nothing
            // to take over, and its workflow may be closeable.
            let (parent_wf_success, parent_running, parent_scheduled) = {
                let mut infos = self.exec_infos.lock();
                match infos.get_mut(&execution_id) {
                    Some(info) => {
                        if !outcome {
                            info.failed_wfs.insert(parent_wf);
                        }
                        (
                            !info.failed_wfs.contains(&parent_wf),
                            info.running_jobs.get(&parent_wf).copied().unwrap_or(0),
                            info.in_flight.get(&parent_wf).map(|s| s.len()).unwrap_or(0),
                        )
                    }
                    None => return Ok(()),
                }
            };
            if parent_running > 0 || parent_scheduled > 0 {
                // Scheduled siblings close this workflow later.
                break;
            }

            let grandparent = model.parent_vertex(parent);
            chain.push(ClosedWf {
                exec_wf_id: parent_wf,
                success: parent_wf_success,
                containing_vertex: grandparent,
            });
            outcome = parent_wf_success;
            cursor = grandparent;
        }

        // Persist the whole chain in one transaction.
        let vertex_updates: Vec<(ExecVertexId, RunStatus)> = chain
            .iter()
            .filter_map(|c| c.containing_vertex.map(|v| (v, RunStatus::finished(c.success))))
            .collect();
        let wf_updates: Vec<(ExecWorkflowId, RunStatus)> =
            chain.iter().map(|c| (c.exec_wf_id, RunStatus::finished(c.success))).collect();
        self.store.finish_workflow_chain(&vertex_updates, &wf_updates, now).await?;

        for closed in &chain {
            self.emit(StatusEvent::WfFinished {
                execution_id,
                exec_wf_id: closed.exec_wf_id,
                vertices: closed.containing_vertex.into_iter().collect(),
                success: closed.success,
            })
            .await?;
        }

        if let Some((top, top_outcome)) = chain_top {
            let next = model.dependencies(top, top_outcome);
            self.run_nodes(execution_id, next).await?;
        }

        let root_wf = model.root_workflow();
        if let Some(root_closed) =
            chain.iter().find(|c| root_wf.map(|r| r == c.exec_wf_id).unwrap_or(false))
        {
            self.execution_finished(execution_id, root_closed.success).await?;
        }
        Ok(())
    }

    /// Finalize an execution: persist, announce, purge from memory.
    pub(crate) async fn execution_finished(
        &self,
        execution_id: ExecutionId,
        success: bool,
    ) -> Result<(), RuntimeError> {
        let now = self.clock.epoch_ms();
        let status = RunStatus::finished(success);
        self.store.finish_execution(execution_id, status, now).await?;
        self.emit(StatusEvent::ExecutionFinished { execution_id, status, finish_ts: now })
            .await?;

        let info = self.exec_infos.lock().remove(&execution_id);
        tracing::info!(execution = %execution_id, success, "execution finished");

        if !success {
            let name = info.map(|i| i.root_wf_name).unwrap_or_default();
            if let Err(e) = self
                .notifier
                .execution_failed(execution_id, &name, "one or more vertices finished in error")
                .await
            {
                tracing::warn!(error = %e, "failure notification not sent");
            }
        }
        Ok(())
    }
}
